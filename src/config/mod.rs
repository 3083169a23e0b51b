// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The data model supplied by the external collaborator that populates the
//! staging directory: package metadata, scriptlets, dependency overrides and
//! emission options (spec.md §3).

use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

mod builder;

pub use builder::PackageInputsBuilder;

use crate::sign::SigningConfig;

/// A package-manager-canonical architecture tag, e.g. `x86_64`, `aarch64`,
/// `armv7`. Kept as a newtype rather than a bare `String` so call sites can't
/// accidentally pass a Rust target triple where an APK arch tag is expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Arch(pub String);

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S: Into<String>> From<S> for Arch {
    fn from(s: S) -> Self {
        Self(s.into())
    }
}

/// Package family identity, shared across all subpackages built from one origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Origin {
    /// The origin package name.
    pub name: String,
    /// The package version, without the `-rN` epoch suffix.
    pub version: String,
    /// The integer revision/epoch.
    pub epoch: u64,
    /// SPDX license identifiers.
    #[serde(default)]
    pub license: Vec<String>,
}

/// One shell-script-shaped lifecycle hook embedded in the control archive.
/// An empty or absent value means the hook is not emitted at all.
pub type ScriptletBody = String;

/// The trigger scriptlet additionally carries the filesystem path prefixes
/// that arm it (spec.md §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trigger {
    /// Ordered list of path prefixes this trigger watches.
    pub paths: Vec<String>,
    /// The trigger script body.
    pub script: ScriptletBody,
}

/// The fixed set of install-lifecycle scriptlets a subpackage may carry
/// (spec.md §3: `{pre-install, post-install, pre-deinstall, post-deinstall,
/// pre-upgrade, post-upgrade, trigger}`). Modeled as a struct with one field
/// per key rather than a generic map: the key set is closed, so an invalid
/// key should be a compile error, not a runtime one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scriptlets {
    /// Run before the package's files are installed.
    pub pre_install: Option<ScriptletBody>,
    /// Run after the package's files are installed.
    pub post_install: Option<ScriptletBody>,
    /// Run before the package's files are removed.
    pub pre_deinstall: Option<ScriptletBody>,
    /// Run after the package's files are removed.
    pub post_deinstall: Option<ScriptletBody>,
    /// Run before an existing install is upgraded to this version.
    pub pre_upgrade: Option<ScriptletBody>,
    /// Run after an existing install is upgraded to this version.
    pub post_upgrade: Option<ScriptletBody>,
    /// Armed by filesystem path prefixes rather than a lifecycle event.
    pub trigger: Option<Trigger>,
}

impl Scriptlets {
    /// Iterates over every non-empty scriptlet as `(control-archive filename, body)`,
    /// matching the fixed names in spec.md §4.7 / §6.
    pub(crate) fn files(&self) -> Vec<(&'static str, &str)> {
        let mut files = Vec::new();
        let mut push = |name: &'static str, body: &Option<ScriptletBody>| {
            if let Some(body) = body {
                if !body.is_empty() {
                    files.push((name, body.as_str()));
                }
            }
        };
        push(".pre-install", &self.pre_install);
        push(".post-install", &self.post_install);
        push(".pre-deinstall", &self.pre_deinstall);
        push(".post-deinstall", &self.post_deinstall);
        push(".pre-upgrade", &self.pre_upgrade);
        push(".post-upgrade", &self.post_upgrade);
        if let Some(trigger) = &self.trigger {
            if !trigger.script.is_empty() {
                files.push((".trigger", trigger.script.as_str()));
            }
        }
        files
    }
}

/// Toggles that suppress parts of the automatic dependency synthesis
/// (spec.md §3, §4.3, §4.4).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Options {
    /// Suppress `cmd:*` provider scanning entirely.
    #[serde(default)]
    pub no_commands: bool,
    /// Suppress `so:*=VER` provider extraction from regular-file SONAMEs.
    #[serde(default)]
    pub no_provides: bool,
    /// Suppress `so:*` runtime dependency extraction (PT_INTERP and DT_NEEDED).
    #[serde(default)]
    pub no_depends: bool,
    /// Use the subpackage name, not the origin name, as `.PKGINFO`'s `origin` field.
    #[serde(default)]
    pub strip_origin_name: bool,
}

/// The per-subpackage inputs: identity, base dependencies and scriptlets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subpackage {
    /// Emitted as `.PKGINFO`'s `pkgname`.
    pub name: String,
    /// User-declared base runtime dependencies, merged with generator output by C6.
    #[serde(default)]
    pub base_runtime: Vec<String>,
    /// User-declared base provides, merged with generator output by C6.
    #[serde(default)]
    pub base_provides: Vec<String>,
    /// User-declared replaces relations, passed through untouched.
    #[serde(default)]
    pub base_replaces: Vec<String>,
    /// Optional `provider_priority` control field.
    pub provider_priority: Option<i64>,
    /// Scriptlet bodies.
    #[serde(default)]
    pub scriptlets: Scriptlets,
    /// `.PKGINFO`'s `pkgdesc`.
    pub description: Option<String>,
    /// `.PKGINFO`'s `url`.
    pub url: Option<String>,
    /// `.PKGINFO`'s `commit`.
    pub commit: Option<String>,
}

/// Everything the emission core needs for one subpackage build
/// (spec.md §3, "PackageInputs").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageInputs {
    /// The package family this subpackage belongs to.
    pub origin: Origin,
    /// This subpackage's identity, dependencies and scriptlets.
    pub subpackage: Subpackage,
    /// The target architecture tag.
    pub arch: Arch,
    /// Toggles that suppress parts of automatic dependency synthesis.
    #[serde(default)]
    pub options: Options,
    /// 0 means "unset" (spec.md §3).
    #[serde(default)]
    pub source_date_epoch: u64,
    /// Names of every subpackage declared alongside this one in the build
    /// configuration (not including the origin name), used by the
    /// cross-package symlink resolver (spec.md §4.5).
    #[serde(default)]
    pub sibling_subpackages: Vec<String>,
    /// Optional RSA signing material.
    #[serde(skip)]
    pub signing: Option<SigningConfig>,
    /// The workspace root; `<workspace>/melange-out/<name>` is the staging directory.
    pub workspace: PathBuf,
    /// Where the finished `.apk` (and `packages.log`) are written.
    pub out_dir: PathBuf,
    /// Reserved for parity with the external build pipeline's contract; this
    /// core never writes to it (spec.md §9: "the build-log path argument is
    /// currently passed as an empty string").
    pub build_log: Option<PathBuf>,
    /// Where to write the `<path>.<arch>` dependency-log JSON, if configured.
    pub dependency_log: Option<PathBuf>,
}

impl PackageInputs {
    /// `<workspace>/melange-out/<subpackage-name>`.
    pub fn staging_dir(&self) -> PathBuf {
        self.melange_out(&self.subpackage.name)
    }

    /// `<workspace>/melange-out/<pkg>` for an arbitrary sibling package name.
    pub fn melange_out(&self, pkg: &str) -> PathBuf {
        self.workspace.join("melange-out").join(pkg)
    }

    /// `pkgver` as emitted in `.PKGINFO`: `<version>-r<epoch>`.
    pub fn full_version(&self) -> String {
        format!("{}-r{}", self.origin.version, self.origin.epoch)
    }

    /// The `origin` field value in `.PKGINFO`, honoring `strip_origin_name`.
    pub fn origin_name(&self) -> &str {
        if self.options.strip_origin_name {
            &self.subpackage.name
        } else {
            &self.origin.name
        }
    }

    /// `<outdir>/<name>-<version>-r<epoch>.apk`.
    pub fn output_path(&self) -> PathBuf {
        self.out_dir.join(format!(
            "{}-{}.apk",
            self.subpackage.name,
            self.full_version()
        ))
    }

    /// All package names the cross-package symlink resolver should search
    /// (spec.md §4.5): the current subpackage, the origin package, and every
    /// declared sibling subpackage.
    pub(crate) fn resolvable_package_names(&self) -> Vec<&str> {
        let mut names = vec![self.subpackage.name.as_str(), self.origin.name.as_str()];
        names.extend(self.sibling_subpackages.iter().map(String::as_str));
        names
    }
}

/// Four lists of package-manager relation strings (spec.md §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dependencies {
    /// Sorted, deduplicated, self-provision-stripped runtime requirements.
    pub runtime: Vec<String>,
    /// Sorted, deduplicated provided names.
    pub provides: Vec<String>,
    /// Replace relations, passed through unmodified.
    pub replaces: Vec<String>,
    /// Optional provider priority, used to break ties between packages
    /// that provide the same name.
    pub provider_priority: Option<i64>,
}

/// Result of a successful emission.
#[derive(Debug, Clone)]
pub struct PackageOutput {
    /// Path to the written `.apk` file.
    pub path: PathBuf,
    /// The finalized dependency lists embedded in `.PKGINFO`.
    pub dependencies: Dependencies,
    /// The SHA-256 hex digest of the data section, equal to `.PKGINFO`'s `datahash`.
    pub data_hash: String,
}

pub(crate) fn library_dirs() -> &'static [&'static str] {
    &["lib", "usr/lib", "lib64", "usr/lib64"]
}

pub(crate) fn command_dir_prefixes() -> &'static [&'static str] {
    &["bin/", "sbin/", "usr/bin/", "usr/sbin/"]
}
