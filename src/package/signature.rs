// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The signature section builder (C9, spec.md §4.9): signs the control
//! digest and wraps the raw signature bytes in a one-file tar+gzip stream.

use std::fs::File;

use crate::{
    archive::{write_archive, ArchiveEntry, ArchiveOptions},
    sign::{sign_control_digest, SigningConfig},
};

/// Signs `control_digest` and emits the signature section to `sink`.
pub(crate) fn build(
    signing: &SigningConfig,
    control_digest: &[u8],
    source_date_epoch: u64,
    sink: File,
) -> crate::Result<File> {
    let signature_bytes = sign_control_digest(signing, control_digest)?;
    let basename = signing.key_basename()?;
    let entry_name = format!(".SIGN.RSA.{basename}.pub");

    let entries = vec![ArchiveEntry::InMemory {
        rel_path: &entry_name,
        mode: 0o644,
        content: &signature_bytes,
    }];
    let opts = ArchiveOptions::new(source_date_epoch);

    write_archive(&entries, sink, &opts)
}
