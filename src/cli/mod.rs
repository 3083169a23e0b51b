// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The cli entry point. Not a build pipeline: it accepts a JSON-encoded
//! [`PackageInputs`] (as the external collaborator would construct
//! in-process) and drives one emission, for manual testing and scripting
//! around an already-staged tree.

#![cfg(feature = "cli")]

use std::path::PathBuf;

use clap::Parser;

use crate::{
    config::PackageInputs,
    sign::SigningConfig,
    Result,
};

#[derive(Parser, Debug)]
#[clap(author, version, about, bin_name("apk-packager"))]
pub(crate) struct Cli {
    /// Enables verbose logging.
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a JSON file holding a serialized `PackageInputs`. Reads from
    /// stdin when omitted.
    #[clap(short, long)]
    inputs: Option<PathBuf>,

    /// Load an RSA private key from this path to sign the emitted package.
    #[clap(short = 'k', long, env = "APK_PACKAGER_SIGN_PRIVATE_KEY")]
    private_key: Option<PathBuf>,

    /// The passphrase for the signing private key.
    #[clap(long, env = "APK_PACKAGER_SIGN_PRIVATE_KEY_PASSWORD")]
    password: Option<String>,
}

fn read_inputs(path: Option<&PathBuf>) -> Result<PackageInputs> {
    let json = match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| crate::Error::IoWithPath(path.clone(), e))?,
        None => std::io::read_to_string(std::io::stdin()).map_err(crate::Error::Io)?,
    };
    Ok(serde_json::from_str(&json)?)
}

#[tracing::instrument(level = "trace", skip(cli))]
fn run_cli(cli: Cli) -> Result<()> {
    let mut inputs = read_inputs(cli.inputs.as_ref())?;

    if let Some(private_key) = cli.private_key {
        let mut signing = SigningConfig::new(private_key);
        if let Some(password) = cli.password {
            signing = signing.with_passphrase(password);
        }
        inputs.signing = Some(signing);
    }

    let output = crate::package(&inputs)?;
    tracing::info!(path = %output.path.display(), datahash = %output.data_hash, "done");
    Ok(())
}

/// Parses arguments and runs the cli. Called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    crate::init_tracing_subscriber(cli.verbose);
    run_cli(cli)
}
