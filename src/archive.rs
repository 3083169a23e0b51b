// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The deterministic tar/gzip writer (spec.md §4.1). Generalizes the
//! teacher's `util::create_tar_from_dir`/`deb::create_tar_from_dir`
//! (`tar::Builder` over a `flate2::GzEncoder`, `HeaderMode::Deterministic`)
//! to: normalized ownership, a configurable source-date-epoch mtime,
//! in-memory entries (for `.PKGINFO`/scriptlets/the signature file, which
//! have no file on disk), and optional per-file PAX checksums.
//!
//! [`write_archive`] always emits exactly one complete gzip member -- never
//! a trailing terminator of its own -- so the control, signature and data
//! sections remain three independently hashable streams right up until
//! [`crate::package::mod`] concatenates them. The one place a trailing
//! empty-member marker is needed (closing out the whole `.apk`) is added by
//! [`append_gzip_terminator`], called once, after the data section's digest
//! has already been captured (spec.md §4.1: "skip-close... allows a later
//! stream to be appended and the concatenation remain a valid gzip file").

use std::io::Write;

use flate2::{write::GzEncoder, Compression};
use sha2::{Digest, Sha256};

use crate::staging::{EntryKind, StagedEntry};

/// Normalized ownership and emission behavior shared by every section writer
/// (spec.md §4.1's enumerated writer configuration).
#[derive(Debug, Clone)]
pub(crate) struct ArchiveOptions {
    pub(crate) source_date_epoch: u64,
    pub(crate) uid: u64,
    pub(crate) gid: u64,
    pub(crate) uname: String,
    pub(crate) gname: String,
    /// Record a SHA-256 checksum of each regular file's content in a PAX
    /// extended header (used for the data section, spec.md §4.8).
    pub(crate) use_checksums: bool,
}

impl ArchiveOptions {
    /// Every section in this emission core uses uid=0/gid=0/root:root
    /// (spec.md §3's "ownership normalization" invariant leaves no room for
    /// overriding this per call, even though the writer itself is generic).
    pub(crate) fn new(source_date_epoch: u64) -> Self {
        Self {
            source_date_epoch,
            uid: 0,
            gid: 0,
            uname: "root".to_string(),
            gname: "root".to_string(),
            use_checksums: false,
        }
    }

    pub(crate) fn use_checksums(mut self, value: bool) -> Self {
        self.use_checksums = value;
        self
    }
}

/// One entry to be written into a section: either a staged filesystem entry
/// or an in-memory file synthesized by the control/signature builders.
pub(crate) enum ArchiveEntry<'a> {
    Staged(&'a StagedEntry),
    InMemory {
        rel_path: &'a str,
        mode: u32,
        content: &'a [u8],
    },
}

fn base_header(opts: &ArchiveOptions, mode: u32) -> tar::Header {
    let mut header = tar::Header::new_gnu();
    header.set_mode(mode);
    header.set_uid(opts.uid);
    header.set_gid(opts.gid);
    header.set_username(&opts.uname).ok();
    header.set_groupname(&opts.gname).ok();
    header.set_mtime(opts.source_date_epoch);
    header
}

/// Writes `entries` as a gzip-wrapped tar stream to `sink`, in the order
/// given (callers are responsible for the lexicographic ordering required by
/// spec.md §4.1). Returns the sink so the caller can rewind/reuse it.
pub(crate) fn write_archive<W: Write>(
    entries: &[ArchiveEntry<'_>],
    sink: W,
    opts: &ArchiveOptions,
) -> crate::Result<W> {
    let encoder = GzEncoder::new(sink, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    for entry in entries {
        match entry {
            ArchiveEntry::Staged(staged) => write_staged_entry(&mut builder, staged, opts)?,
            ArchiveEntry::InMemory {
                rel_path,
                mode,
                content,
            } => {
                let mut header = base_header(opts, *mode);
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(content.len() as u64);
                header.set_cksum();
                builder.append_data(&mut header, rel_path, *content)?;
            }
        }
    }

    let encoder = builder.into_inner()?;
    let sink = encoder.finish()?;
    Ok(sink)
}

/// Appends an empty gzip member to `sink`, marking the true end of the
/// `.apk` file once every section has been concatenated (spec.md §4.1, §4.8:
/// the data section is the last member of an unsigned package, and signed
/// packages still end with the data section). Call this only after any
/// digest over `sink`'s prior contents has already been captured -- the
/// terminator itself is not part of `datahash`.
pub(crate) fn append_gzip_terminator<W: Write>(mut sink: W) -> crate::Result<W> {
    GzEncoder::new(&mut sink, Compression::default()).finish()?;
    Ok(sink)
}

fn write_staged_entry<W: Write>(
    builder: &mut tar::Builder<W>,
    entry: &StagedEntry,
    opts: &ArchiveOptions,
) -> crate::Result<()> {
    let mut header = base_header(opts, entry.mode);

    match entry.kind {
        EntryKind::Dir => {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_size(0);
            header.set_cksum();
            let mut name = entry.rel_path.clone();
            if !name.ends_with('/') {
                name.push('/');
            }
            builder.append_data(&mut header, name, std::io::empty())?;
        }
        EntryKind::Symlink => {
            header.set_entry_type(tar::EntryType::Symlink);
            header.set_size(0);
            let target = entry.link_target.clone().unwrap_or_default();
            header.set_link_name(&target)?;
            header.set_cksum();
            builder.append_data(&mut header, &entry.rel_path, std::io::empty())?;
        }
        EntryKind::File => {
            let content =
                std::fs::read(&entry.abs_path).map_err(|e| crate::Error::IoWithPath(entry.abs_path.clone(), e))?;

            if opts.use_checksums {
                let digest = hex::encode(Sha256::digest(&content));
                builder.append_pax_extensions(vec![("APK.SHA256", digest.as_bytes())])?;
            }

            header.set_entry_type(tar::EntryType::Regular);
            header.set_size(content.len() as u64);
            header.set_cksum();
            builder.append_data(&mut header, &entry.rel_path, content.as_slice())?;
        }
    }

    Ok(())
}
