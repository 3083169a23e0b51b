// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The packager (C10, spec.md §4.10): orchestrates C1-C9 end to end and
//! concatenates the resulting sections into one `.apk` file.

use std::{
    fs::{File, OpenOptions},
    io::{Seek, SeekFrom, Write},
};

use crate::{
    commands,
    config::{Dependencies, PackageInputs, PackageOutput},
    depends,
    elf::{self, GeneratedDependencies},
    staging::StagingView,
    util::{self, PathExt},
};

mod context;
mod control;
mod data;
mod signature;

use context::Context;
use control::ControlDigestAlgo;

/// Runs one full emission: scans the staging tree, synthesizes dependencies,
/// builds the data/control/signature sections and concatenates them into the
/// output `.apk` (spec.md §4.10).
#[tracing::instrument(level = "trace", skip(inputs))]
pub fn package(inputs: &PackageInputs) -> crate::Result<PackageOutput> {
    // Step 1: the staging directory is populated by an earlier build stage;
    // ensure it exists without touching its contents.
    let staging_dir = inputs.staging_dir();
    util::ensure_dir(&staging_dir)?;
    let view = StagingView::new(staging_dir)?;

    let ctx = Context::new(inputs);

    // Step 2: C3 then C4, accumulated into one generator output.
    let mut generated = GeneratedDependencies::default();
    elf::scan(
        &view,
        &inputs.options,
        &ctx.staging_roots,
        &ctx.package_names(),
        &mut generated,
    )?;
    commands::scan(
        &view,
        &inputs.full_version(),
        &inputs.options,
        &mut generated,
    )?;

    if let Some(dependency_log) = &inputs.dependency_log {
        write_dependency_log(dependency_log, &inputs.arch.0, &generated)?;
    }

    let dependencies: Dependencies = depends::finish(&inputs.subpackage, generated);

    // Step 3: installed size.
    let installed_size = view.installed_size()?;

    // Step 4: data section first -- the control section embeds its hash.
    tracing::debug!("building data section");
    let data_file = tempfile::tempfile().map_err(crate::Error::Io)?;
    let (data_file, data_hash) = data::build(&view, inputs.source_date_epoch, data_file)?;

    // Step 5: control digest algorithm depends on whether we're signing.
    let algo = if inputs.signing.is_some() {
        ControlDigestAlgo::Sha1
    } else {
        ControlDigestAlgo::Sha256
    };
    tracing::debug!("building control section");
    let control_file = tempfile::tempfile().map_err(crate::Error::Io)?;
    let (control_file, control_digest) = control::build(
        inputs,
        &dependencies,
        installed_size,
        &data_hash,
        algo,
        control_file,
    )?;

    // Step 6: sign the control digest, if configured.
    let signature_file = if let Some(signing) = &inputs.signing {
        tracing::debug!("building signature section");
        let sig_file = tempfile::tempfile().map_err(crate::Error::Io)?;
        Some(signature::build(
            signing,
            &control_digest,
            inputs.source_date_epoch,
            sig_file,
        )?)
    } else {
        None
    };

    // Step 7: ensure the output directory exists and create the output file.
    util::ensure_dir(&inputs.out_dir)?;
    let output_path = inputs.output_path();
    let mut output = util::create_file(&output_path)?;

    // Step 8: concatenate [signature?, control, data] in order.
    concat_section(signature_file, &mut output)?;
    concat_section(Some(control_file), &mut output)?;
    concat_section(Some(data_file), &mut output)?;
    output.flush().map_err(crate::Error::Io)?;

    // Step 9: temp files are unnamed (tempfile::tempfile) and are already
    // gone once dropped; best-effort packages.log append.
    tracing::info!(path = %output_path.display(), "emitted package");
    append_packages_log(inputs);

    Ok(PackageOutput {
        path: output_path,
        dependencies,
        data_hash,
    })
}

fn concat_section(section: Option<File>, output: &mut impl Write) -> crate::Result<()> {
    if let Some(mut file) = section {
        file.seek(SeekFrom::Start(0)).map_err(crate::Error::Io)?;
        std::io::copy(&mut file, output).map_err(crate::Error::Io)?;
    }
    Ok(())
}

fn write_dependency_log(
    path: &std::path::Path,
    arch: &str,
    generated: &GeneratedDependencies,
) -> crate::Result<()> {
    let log_path = path.with_additional_extension(arch);
    let json = serde_json::to_string_pretty(&generated.consumers)?;
    let mut file = util::create_file(&log_path)?;
    file.write_all(json.as_bytes()).map_err(crate::Error::Io)?;
    Ok(())
}

/// Appends one pipe-delimited line to `packages.log` in the output directory.
/// Best-effort: a failure here is logged and swallowed (spec.md §4.10 step 9,
/// §7 point 6), never propagated to the caller.
fn append_packages_log(inputs: &PackageInputs) {
    let log_path = inputs.out_dir.join("packages.log");
    let line = format!(
        "{}|{}|{}|{}\n",
        inputs.arch,
        inputs.origin.name,
        inputs.subpackage.name,
        inputs.full_version()
    );

    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .and_then(|mut f| f.write_all(line.as_bytes()));

    if let Err(e) = result {
        tracing::warn!(path = %log_path.display(), error = %e, "failed to append to packages.log");
    }
}
