// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The control section builder (C7, spec.md §4.7): renders `.PKGINFO` and
//! any non-empty scriptlet files, then tar+gzips them (no terminator) while
//! tee'ing the bytes through a digest. Generalizes the teacher's
//! `deb::generate_control_file` (handlebars template rendering) to a plain
//! literal template, since `.PKGINFO` has a fixed, non-user-configurable shape.

use std::fs::File;

use sha1::Sha1;
use sha2::Sha256;

use crate::{
    archive::{write_archive, ArchiveEntry, ArchiveOptions},
    config::{Dependencies, PackageInputs},
    util::HashingWriter,
};

/// Picked by the packager based on whether signing is configured (spec.md
/// §4.10 step 5; §9: "parameterize the control-section builder on a digest
/// factory rather than embedding sha1/sha256 selection inside it").
pub(crate) enum ControlDigestAlgo {
    Sha1,
    Sha256,
}

fn render_pkginfo(
    inputs: &PackageInputs,
    dependencies: &Dependencies,
    installed_size: u64,
    data_hash: &str,
) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    out.push_str("# Generated by melange.\n");
    let _ = writeln!(out, "pkgname = {}", inputs.subpackage.name);
    let _ = writeln!(out, "pkgver = {}", inputs.full_version());
    let _ = writeln!(out, "arch = {}", inputs.arch);
    let _ = writeln!(out, "size = {installed_size}");
    let _ = writeln!(out, "origin = {}", inputs.origin_name());

    if let Some(desc) = &inputs.subpackage.description {
        let _ = writeln!(out, "pkgdesc = {desc}");
    }
    if let Some(url) = &inputs.subpackage.url {
        let _ = writeln!(out, "url = {url}");
    }
    if let Some(commit) = &inputs.subpackage.commit {
        let _ = writeln!(out, "commit = {commit}");
    }
    if inputs.source_date_epoch != 0 {
        let _ = writeln!(out, "builddate = {}", inputs.source_date_epoch);
    }
    for license in &inputs.origin.license {
        let _ = writeln!(out, "license = {license}");
    }
    for dep in &dependencies.runtime {
        let _ = writeln!(out, "depend = {dep}");
    }
    for provide in &dependencies.provides {
        let _ = writeln!(out, "provides = {provide}");
    }
    for replace in &dependencies.replaces {
        let _ = writeln!(out, "replaces = {replace}");
    }
    if let Some(priority) = dependencies.provider_priority {
        let _ = writeln!(out, "provider_priority = {priority}");
    }
    if let Some(trigger) = &inputs.subpackage.scriptlets.trigger {
        if !trigger.paths.is_empty() {
            let _ = writeln!(out, "triggers = {}", trigger.paths.join(" "));
        }
    }
    let _ = writeln!(out, "datahash = {data_hash}");

    out
}

/// Renders and emits the control section, returning the sink and the raw
/// digest bytes (20 bytes for SHA-1, 32 for SHA-256) for C9/C10.
pub(crate) fn build(
    inputs: &PackageInputs,
    dependencies: &Dependencies,
    installed_size: u64,
    data_hash: &str,
    algo: ControlDigestAlgo,
    sink: File,
) -> crate::Result<(File, Vec<u8>)> {
    let pkginfo = render_pkginfo(inputs, dependencies, installed_size, data_hash);

    let mut entries = vec![ArchiveEntry::InMemory {
        rel_path: ".PKGINFO",
        mode: 0o644,
        content: pkginfo.as_bytes(),
    }];
    for (name, body) in inputs.subpackage.scriptlets.files() {
        entries.push(ArchiveEntry::InMemory {
            rel_path: name,
            mode: 0o755,
            content: body.as_bytes(),
        });
    }

    let opts = ArchiveOptions::new(inputs.source_date_epoch);

    match algo {
        ControlDigestAlgo::Sha1 => {
            use sha1::Digest as _;
            let hashing = HashingWriter::new(sink, Sha1::new());
            let hashing = write_archive(&entries, hashing, &opts)?;
            Ok(hashing.finish())
        }
        ControlDigestAlgo::Sha256 => {
            use sha2::Digest as _;
            let hashing = HashingWriter::new(sink, Sha256::new());
            let hashing = write_archive(&entries, hashing, &opts)?;
            Ok(hashing.finish())
        }
    }
}
