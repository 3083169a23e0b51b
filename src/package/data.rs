// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The data section builder (C8, spec.md §4.8): tars and gzips the whole
//! staging filesystem, with per-file PAX checksums and no `skip_close` (it
//! is the last member of an unsigned `.apk`), tee'd through SHA-256 to
//! produce `datahash`. Must run before C7, since the control section embeds
//! this hash.

use std::fs::File;

use sha2::{Digest, Sha256};

use crate::{
    archive::{append_gzip_terminator, write_archive, ArchiveEntry, ArchiveOptions},
    staging::StagingView,
    util::HashingWriter,
};

/// Emits the data section to `sink`, returning the sink and the hex-encoded
/// SHA-256 digest of the data section's own gzip member (the trailing
/// end-of-`.apk` terminator is appended afterwards and is not covered by the
/// digest, per spec.md §4.8's "datahash binding" invariant).
pub(crate) fn build(
    view: &StagingView,
    source_date_epoch: u64,
    sink: File,
) -> crate::Result<(File, String)> {
    let staged = view.entries()?;
    let entries: Vec<_> = staged.iter().map(ArchiveEntry::Staged).collect();
    let opts = ArchiveOptions::new(source_date_epoch).use_checksums(true);

    let hashing = HashingWriter::new(sink, Sha256::new());
    let hashing = write_archive(&entries, hashing, &opts)?;
    let (file, digest) = hashing.finish();
    let file = append_gzip_terminator(file)?;
    Ok((file, hex::encode(digest)))
}
