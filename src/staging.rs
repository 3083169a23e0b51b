// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! A read-only, symlink-preserving view over a subpackage's staging directory
//! (spec.md §4.2). Mirrors the teacher's `walkdir`-based directory traversal
//! (`util::create_tar_from_dir`), but reports symlinks as symlinks instead of
//! following them, and returns a stably-ordered snapshot rather than streaming
//! straight into a tar writer.

use std::{
    fs,
    os::unix::fs::MetadataExt,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::Error;

/// The on-disk kind of one staged entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EntryKind {
    Dir,
    File,
    Symlink,
}

/// One entry in the staging tree, relative to the staging root.
#[derive(Debug, Clone)]
pub(crate) struct StagedEntry {
    /// Path relative to the staging root, using `/` separators (tar entry name).
    pub(crate) rel_path: String,
    /// Absolute path on disk.
    pub(crate) abs_path: PathBuf,
    pub(crate) kind: EntryKind,
    /// Permission bits (the low 12 bits of `st_mode`).
    pub(crate) mode: u32,
    /// File size in bytes; zero for directories and symlinks.
    pub(crate) size: u64,
    /// Symlink target, if this entry is a symlink.
    pub(crate) link_target: Option<PathBuf>,
}

impl StagedEntry {
    /// `mode & 0o555 == 0o555`: every read/execute bit present for owner,
    /// group and other (spec.md §4.3, §4.4).
    pub(crate) fn is_executable(&self) -> bool {
        self.kind == EntryKind::File && (self.mode & 0o555) == 0o555
    }

    pub(crate) fn basename(&self) -> &str {
        self.rel_path.rsplit('/').next().unwrap_or(&self.rel_path)
    }
}

/// The staging directory for one subpackage.
pub(crate) struct StagingView {
    root: PathBuf,
}

impl StagingView {
    /// Opens the staging view, checking that the directory exists (spec.md
    /// §4.10 step 1 expects the caller to have ensured it, but a scan against
    /// a missing root should fail clearly rather than silently enumerate
    /// zero entries).
    pub(crate) fn new(root: PathBuf) -> crate::Result<Self> {
        if !root.exists() {
            return Err(Error::StagingDirNotFound(root));
        }
        Ok(Self { root })
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    /// Enumerates every entry under the staging root in lexicographic path
    /// order, depth-first (spec.md §4.1, §4.2: "ordering across enumerations
    /// is stable for deterministic archive output").
    pub(crate) fn entries(&self) -> crate::Result<Vec<StagedEntry>> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry?;
            if entry.path() == self.root {
                continue;
            }
            let rel = entry.path().strip_prefix(&self.root)?;
            let rel_path = rel
                .to_str()
                .ok_or_else(|| Error::NonUtf8Path(entry.path().to_path_buf()))?
                .replace(std::path::MAIN_SEPARATOR, "/");

            let meta = fs::symlink_metadata(entry.path())
                .map_err(|e| Error::IoWithPath(entry.path().to_path_buf(), e))?;
            let file_type = meta.file_type();

            let (kind, link_target) = if file_type.is_symlink() {
                let target = fs::read_link(entry.path())
                    .map_err(|e| Error::IoWithPath(entry.path().to_path_buf(), e))?;
                (EntryKind::Symlink, Some(target))
            } else if file_type.is_dir() {
                (EntryKind::Dir, None)
            } else {
                (EntryKind::File, None)
            };

            entries.push(StagedEntry {
                rel_path,
                abs_path: entry.path().to_path_buf(),
                kind,
                mode: meta.mode() & 0o7777,
                size: if kind == EntryKind::File {
                    meta.size()
                } else {
                    0
                },
                link_target,
            });
        }

        entries.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        Ok(entries)
    }

    /// Sum of `Size()` over every regular file (spec.md §4.7: "installed-size
    /// is the arithmetic sum of `Size()` over all regular entries... this sum
    /// is deliberately the sum of file sizes, not an on-disk block-aligned
    /// computation").
    pub(crate) fn installed_size(&self) -> crate::Result<u64> {
        Ok(self.entries()?.iter().map(|e| e.size).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::{symlink, PermissionsExt};

    #[test]
    fn enumerates_in_lexicographic_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("usr/bin")).unwrap();
        fs::write(dir.path().join("usr/bin/b"), b"b").unwrap();
        fs::write(dir.path().join("a"), b"aa").unwrap();
        symlink("b", dir.path().join("usr/bin/link")).unwrap();

        let view = StagingView::new(dir.path().to_path_buf()).unwrap();
        let entries = view.entries().unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.rel_path.clone()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
        assert!(paths.contains(&"usr/bin/link".to_string()));

        let link = entries
            .iter()
            .find(|e| e.rel_path == "usr/bin/link")
            .unwrap();
        assert_eq!(link.kind, EntryKind::Symlink);
        assert_eq!(link.link_target, Some(PathBuf::from("b")));
    }

    #[test]
    fn installed_size_sums_regular_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme"), b"hello world").unwrap();
        fs::create_dir_all(dir.path().join("empty-dir")).unwrap();

        let view = StagingView::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(view.installed_size().unwrap(), 11);
    }

    #[test]
    fn executable_bit_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bin-like");
        fs::write(&path, b"x").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        let view = StagingView::new(dir.path().to_path_buf()).unwrap();
        let entries = view.entries().unwrap();
        let entry = entries.iter().find(|e| e.rel_path == "bin-like").unwrap();
        assert!(entry.is_executable());
    }
}
