// Copyright 2016-2019 Cargo-Bundle developers <https://github.com/burtonageo/cargo-bundle>
// Copyright 2019-2023 Tauri Programme within The Commons Conservancy
// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use std::{
    ffi::OsStr,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::Error;

/// Creates a new file at the given path, creating any parent directories as needed.
#[inline]
pub(crate) fn create_file(path: &Path) -> crate::Result<io::BufWriter<File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::IoWithPath(path.to_path_buf(), e))?;
    }
    let file = File::create(path).map_err(|e| Error::IoWithPath(path.to_path_buf(), e))?;
    Ok(io::BufWriter::new(file))
}

/// Idempotently ensures a directory exists (spec.md §4.10 step 1 and step 7:
/// the staging directory and the output directory are each created if missing,
/// but never cleaned -- unlike the teacher's own `create_clean_dir`, which wipes
/// its throwaway intermediates directory before rebuilding it).
#[inline]
pub(crate) fn ensure_dir(path: &Path) -> crate::Result<()> {
    fs::create_dir_all(path).map_err(|e| Error::OutputDir(path.to_path_buf(), e))
}

pub trait PathExt {
    fn with_additional_extension(&self, extension: impl AsRef<OsStr>) -> PathBuf;
}

impl PathExt for Path {
    fn with_additional_extension(&self, extension: impl AsRef<OsStr>) -> PathBuf {
        match self.extension() {
            Some(ext) => {
                let mut e = ext.to_os_string();
                e.push(".");
                e.push(extension);
                self.with_extension(e)
            }
            None => self.with_extension(extension),
        }
    }
}

/// A minimal digest abstraction so a single tee-writer type can be parameterized
/// over SHA-1 (control digest, signed mode) or SHA-256 (control digest, unsigned
/// mode; data digest, always), per spec.md §9: "parameterize the control-section
/// builder on a digest factory rather than embedding sha1/sha256 selection inside it".
pub(crate) trait HexDigest {
    fn update(&mut self, data: &[u8]);
    fn finalize_bytes(self) -> Vec<u8>;
}

impl HexDigest for sha1::Sha1 {
    fn update(&mut self, data: &[u8]) {
        sha1::Digest::update(self, data)
    }
    fn finalize_bytes(self) -> Vec<u8> {
        sha1::Digest::finalize(self).to_vec()
    }
}

impl HexDigest for sha2::Sha256 {
    fn update(&mut self, data: &[u8]) {
        sha2::Digest::update(self, data)
    }
    fn finalize_bytes(self) -> Vec<u8> {
        sha2::Digest::finalize(self).to_vec()
    }
}

/// Tees every byte written through it into a digest as well as an inner writer,
/// so a tar/gzip section can be hashed while it streams to disk instead of being
/// buffered in memory first (spec.md §4.1: "the writer never buffers the whole
/// archive... the caller is responsible for tee'ing the sink through a digest").
pub(crate) struct HashingWriter<W, D> {
    inner: W,
    digest: D,
}

impl<W: Write, D: HexDigest> HashingWriter<W, D> {
    pub(crate) fn new(inner: W, digest: D) -> Self {
        Self { inner, digest }
    }

    /// Consumes the writer, returning the inner writer and the raw digest bytes.
    pub(crate) fn finish(self) -> (W, Vec<u8>) {
        let hash = self.digest.finalize_bytes();
        (self.inner, hash)
    }
}

impl<W: Write, D: HexDigest> Write for HashingWriter<W, D> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.digest.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_appends_ext() {
        assert_eq!(
            PathBuf::from("./asset.tar").with_additional_extension("gz"),
            PathBuf::from("./asset.tar.gz")
        );
        assert_eq!(
            PathBuf::from("./data").with_additional_extension("gz"),
            PathBuf::from("./data.gz")
        );
    }

    #[test]
    fn hashing_writer_matches_direct_digest() {
        use sha2::{Digest, Sha256};

        let mut buf = Vec::new();
        let hash = {
            let mut w = HashingWriter::new(&mut buf, Sha256::new());
            w.write_all(b"hello world").unwrap();
            w.finish().1
        };
        let mut direct = Sha256::new();
        direct.update(b"hello world");
        assert_eq!(hash, direct.finalize().to_vec());
        assert_eq!(buf, b"hello world");
    }
}
