// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use std::process::exit;

fn main() {
    if let Err(e) = apk_packager::cli::run() {
        eprintln!("error: {e}");
        exit(1);
    }
}
