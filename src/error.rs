// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug)]
/// Errors returned while scanning a staging tree or emitting an `.apk`.
pub enum Error {
    /// I/O error with path context.
    #[error("I/O error ({0}): {1}")]
    IoWithPath(PathBuf, std::io::Error),
    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// `walkdir` crate error.
    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),
    /// Path prefix strip error.
    #[error(transparent)]
    StripPrefix(#[from] std::path::StripPrefixError),
    /// A regular, executable file failed to parse as ELF for a reason other than
    /// "this isn't an ELF file" (e.g. truncated read). Treated as fatal, unlike
    /// the soft "not an ELF" case which the scanner handles by skipping the entry.
    #[error("failed to read ELF file {0}: {1}")]
    ElfRead(PathBuf, std::io::Error),
    /// The configured staging directory for a subpackage does not exist.
    #[error("staging directory does not exist: {0}")]
    StagingDirNotFound(PathBuf),
    /// Failed to get the parent directory of a path.
    #[error("failed to get parent directory of {0}")]
    ParentDirNotFound(PathBuf),
    /// Failed to extract a filename from a path.
    #[error("failed to extract filename from {0}")]
    FailedToExtractFilename(PathBuf),
    /// A path was not valid UTF-8 and the operation requires UTF-8.
    #[error("path is not valid UTF-8: {0}")]
    NonUtf8Path(PathBuf),
    /// Failed to decode the configured RSA signing key.
    #[error("failed to load RSA private key from {0}: {1}")]
    SigningKey(PathBuf, String),
    /// RSA signing operation failed.
    #[error(transparent)]
    Rsa(#[from] rsa::Error),
    /// JSON (de)serialization error, used for the dependency log.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// The output directory could not be created.
    #[error("failed to create output directory {0}: {1}")]
    OutputDir(PathBuf, std::io::Error),
    /// Best-effort append to `packages.log` failed. Never returned to the caller;
    /// logged as a warning and swallowed at the call site (spec.md §7 point 6).
    #[error("failed to append to packages log {0}: {1}")]
    PackagesLog(PathBuf, std::io::Error),
}

/// Convenient type alias of the `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
