// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Scans a populated staging directory for ELF binaries and commands,
//! synthesizes `so:*`/`cmd:*` dependency relations, and emits a signed
//! multi-section gzip/tar `.apk` package.
//!
//! This crate implements the package **emission core** only: it expects the
//! caller to have already built and staged a filesystem tree under
//! `<workspace>/melange-out/<pkgname>`. Resolving sources, running build
//! steps, scriptlet execution and package installation are out of scope.
//!
//! ### Library
//!
//! ```no_run
//! use apk_packager::config::{Origin, PackageInputsBuilder};
//!
//! let inputs = PackageInputsBuilder::new(
//!     Origin { name: "hello".into(), version: "1.0".into(), epoch: 0, license: vec!["MIT".into()] },
//!     "hello",
//!     "/tmp/workspace".into(),
//! )
//! .arch("x86_64")
//! .out_dir("/tmp/out".into())
//! .build();
//!
//! let output = apk_packager::package(&inputs)?;
//! println!("wrote {}", output.path.display());
//! # Ok::<(), apk_packager::Error>(())
//! ```
//!
//! #### Feature flags
//!
//! - **`cli`**: enables the `apk-packager` binary and `tracing-subscriber` setup.

#![cfg_attr(doc_cfg, feature(doc_cfg))]
#![deny(missing_docs)]

mod archive;
mod commands;
mod depends;
mod elf;
mod error;
mod package;
mod resolve;
mod staging;
mod util;

#[cfg(feature = "cli")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "cli")))]
pub mod cli;
pub mod config;
pub mod sign;

pub use error::{Error, Result};
pub use package::package;
pub use sign::SigningConfig;

#[cfg(feature = "cli")]
fn parse_log_level(verbose: u8) -> tracing::Level {
    match verbose {
        0 => tracing_subscriber::EnvFilter::builder()
            .from_env_lossy()
            .max_level_hint()
            .and_then(|l| l.into_level())
            .unwrap_or(tracing::Level::INFO),
        1 => tracing::Level::DEBUG,
        2.. => tracing::Level::TRACE,
    }
}

/// Initializes the `tracing` subscriber used by the `cli` binary.
#[cfg(feature = "cli")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "cli")))]
pub fn init_tracing_subscriber(verbosity: u8) {
    let level = parse_log_level(verbosity);
    let debug = level == tracing::Level::DEBUG;
    let trace = level == tracing::Level::TRACE;

    tracing_subscriber::fmt()
        .with_ansi(std::io::IsTerminal::is_terminal(&std::io::stderr()))
        .with_target(debug)
        .with_line_number(trace)
        .with_file(trace)
        .with_max_level(level)
        .compact()
        .init();
}
