// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Black-box coverage of [`apk_packager::package`] against a staged
//! filesystem tree, exercising the scanner/finisher/archiver pipeline through
//! its public surface only.

use std::{
    fs,
    io::Read as _,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use apk_packager::{
    config::{Options, Origin, PackageInputsBuilder},
    SigningConfig,
};
use rsa::pkcs1::EncodeRsaPrivateKey;

/// Creates `<workspace>/melange-out/<name>`, the layout `PackageInputs`
/// expects to find already populated by an earlier build stage.
fn staging_root(workspace: &Path, name: &str) -> PathBuf {
    let root = workspace.join("melange-out").join(name);
    fs::create_dir_all(&root).unwrap();
    root
}

fn write_executable(path: &Path, content: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn builder(workspace: PathBuf, out_dir: PathBuf, name: &str) -> PackageInputsBuilder {
    PackageInputsBuilder::new(
        Origin {
            name: "hello".into(),
            version: "1.0".into(),
            epoch: 0,
            license: vec!["MIT".into()],
        },
        name,
        workspace,
    )
    .arch("x86_64")
    .out_dir(out_dir)
    .source_date_epoch(1_577_836_800)
}

/// Decompresses every gzip member in `bytes` back to back into one
/// continuous byte stream (the `.apk` format is a concatenation of
/// independent gzip members, which `MultiGzDecoder` is built to unwrap).
fn decompress_all(bytes: &[u8]) -> Vec<u8> {
    let mut decoder = flate2::bufread::MultiGzDecoder::new(bytes);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).unwrap();
    out
}

fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack
        .windows(needle.len())
        .any(|w| w == needle.as_bytes())
}

#[test]
fn empty_package_has_no_generated_dependencies() {
    let workspace = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let root = staging_root(workspace.path(), "hello");
    fs::create_dir_all(root.join("usr/share/doc/hello")).unwrap();
    fs::write(root.join("usr/share/doc/hello/README"), b"hello world").unwrap();

    let inputs = builder(workspace.path().to_path_buf(), out_dir.path().to_path_buf(), "hello")
        .options(Options::default())
        .build();

    let output = apk_packager::package(&inputs).unwrap();
    assert!(output.dependencies.runtime.is_empty());
    assert!(output.dependencies.provides.is_empty());
    assert!(output.path.exists());

    let raw = fs::read(&output.path).unwrap();
    let decompressed = decompress_all(&raw);
    assert!(contains(&decompressed, "pkgname = hello\n"));
    assert!(contains(&decompressed, &format!("datahash = {}\n", output.data_hash)));
    assert!(!contains(&decompressed, "depend = "));
    assert!(!contains(&decompressed, "provides = "));
}

#[test]
fn command_provider_is_recorded() {
    let workspace = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let root = staging_root(workspace.path(), "hello");
    write_executable(&root.join("usr/bin/hello"), b"#!/bin/sh\necho hi\n");

    let inputs = builder(workspace.path().to_path_buf(), out_dir.path().to_path_buf(), "hello")
        .options(Options::default())
        .build();

    let output = apk_packager::package(&inputs).unwrap();
    assert_eq!(output.dependencies.provides, vec!["cmd:hello=1.0-r0".to_string()]);

    let raw = fs::read(&output.path).unwrap();
    let decompressed = decompress_all(&raw);
    assert!(contains(&decompressed, "provides = cmd:hello=1.0-r0\n"));
}

#[test]
fn no_commands_option_suppresses_provider_scanning() {
    let workspace = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let root = staging_root(workspace.path(), "hello");
    write_executable(&root.join("usr/bin/hello"), b"#!/bin/sh\necho hi\n");

    let inputs = builder(workspace.path().to_path_buf(), out_dir.path().to_path_buf(), "hello")
        .options(Options {
            no_commands: true,
            ..Default::default()
        })
        .build();

    let output = apk_packager::package(&inputs).unwrap();
    assert!(output.dependencies.provides.is_empty());
}

#[test]
fn user_declared_dependencies_merge_with_generated_ones() {
    let workspace = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    staging_root(workspace.path(), "hello");

    let inputs = builder(workspace.path().to_path_buf(), out_dir.path().to_path_buf(), "hello")
        .base_runtime(["bar>=1.0"])
        .base_provides(["cmd:hello=1.0-r0"])
        .build();

    let output = apk_packager::package(&inputs).unwrap();
    assert_eq!(output.dependencies.runtime, vec!["bar>=1.0".to_string()]);
    assert_eq!(output.dependencies.provides, vec!["cmd:hello=1.0-r0".to_string()]);
}

#[test]
fn signed_package_embeds_a_signature_section() {
    let mut rng = rand::rngs::OsRng;
    let key = rsa::RsaPrivateKey::new(&mut rng, 1024).unwrap();
    let pem = key.to_pkcs1_pem(rsa::pkcs1::LineEnding::LF).unwrap();

    let workspace = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let key_dir = tempfile::tempdir().unwrap();
    let key_path = key_dir.path().join("hello-signing.rsa");
    fs::write(&key_path, pem.as_bytes()).unwrap();

    staging_root(workspace.path(), "hello");

    let inputs = builder(workspace.path().to_path_buf(), out_dir.path().to_path_buf(), "hello")
        .signing(SigningConfig::new(key_path))
        .build();

    let output = apk_packager::package(&inputs).unwrap();
    let raw = fs::read(&output.path).unwrap();
    let decompressed = decompress_all(&raw);

    assert!(contains(&decompressed, ".SIGN.RSA.hello-signing.rsa"));
    assert!(contains(&decompressed, "pkgname = hello\n"));
}

#[test]
fn same_inputs_produce_byte_identical_output() {
    let workspace = tempfile::tempdir().unwrap();
    let out_dir_a = tempfile::tempdir().unwrap();
    let out_dir_b = tempfile::tempdir().unwrap();
    let root = staging_root(workspace.path(), "hello");
    fs::write(root.join("a"), b"aa").unwrap();
    write_executable(&root.join("usr/bin/hello"), b"#!/bin/sh\necho hi\n");

    let inputs_a = builder(workspace.path().to_path_buf(), out_dir_a.path().to_path_buf(), "hello").build();
    let inputs_b = builder(workspace.path().to_path_buf(), out_dir_b.path().to_path_buf(), "hello").build();

    let output_a = apk_packager::package(&inputs_a).unwrap();
    let output_b = apk_packager::package(&inputs_b).unwrap();

    let bytes_a = fs::read(&output_a.path).unwrap();
    let bytes_b = fs::read(&output_b.path).unwrap();
    assert_eq!(bytes_a, bytes_b);
    assert_eq!(output_a.data_hash, output_b.data_hash);
}

#[test]
fn packages_log_records_one_line_per_emission() {
    let workspace = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    staging_root(workspace.path(), "hello");

    let inputs = builder(workspace.path().to_path_buf(), out_dir.path().to_path_buf(), "hello").build();
    apk_packager::package(&inputs).unwrap();

    let log = fs::read_to_string(out_dir.path().join("packages.log")).unwrap();
    assert_eq!(log, "x86_64|hello|hello|1.0-r0\n");
}
