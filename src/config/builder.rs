// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use super::{Arch, Options, Origin, PackageInputs, Scriptlets, Subpackage};
use crate::sign::SigningConfig;

/// A builder type for [`PackageInputs`], mirroring the teacher's
/// `ConfigBuilder` (wrap-and-set rather than a typestate builder, since most
/// fields are independently optional).
pub struct PackageInputsBuilder(PackageInputs);

impl PackageInputsBuilder {
    /// Creates a new builder for the given origin, subpackage name and workspace.
    pub fn new(origin: Origin, subpackage_name: impl Into<String>, workspace: PathBuf) -> Self {
        Self(PackageInputs {
            origin,
            subpackage: Subpackage {
                name: subpackage_name.into(),
                base_runtime: Vec::new(),
                base_provides: Vec::new(),
                base_replaces: Vec::new(),
                provider_priority: None,
                scriptlets: Scriptlets::default(),
                description: None,
                url: None,
                commit: None,
            },
            arch: Arch("x86_64".into()),
            options: Options::default(),
            source_date_epoch: 0,
            sibling_subpackages: Vec::new(),
            signing: None,
            workspace: PathBuf::new(),
            out_dir: PathBuf::new(),
            build_log: None,
            dependency_log: None,
        })
        .workspace(workspace)
    }

    /// Returns a reference to the [`PackageInputs`] built so far.
    pub fn inputs(&self) -> &PackageInputs {
        &self.0
    }

    /// Consumes the builder, returning the finished [`PackageInputs`].
    pub fn build(self) -> PackageInputs {
        self.0
    }

    /// Sets [`PackageInputs::arch`].
    pub fn arch(mut self, arch: impl Into<Arch>) -> Self {
        self.0.arch = arch.into();
        self
    }

    /// Sets [`PackageInputs::options`].
    pub fn options(mut self, options: Options) -> Self {
        self.0.options = options;
        self
    }

    /// Sets [`PackageInputs::source_date_epoch`].
    pub fn source_date_epoch(mut self, epoch: u64) -> Self {
        self.0.source_date_epoch = epoch;
        self
    }

    /// Sets [`PackageInputs::sibling_subpackages`].
    pub fn sibling_subpackages<I: IntoIterator<Item = S>, S: Into<String>>(
        mut self,
        names: I,
    ) -> Self {
        self.0.sibling_subpackages = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets [`PackageInputs::signing`].
    pub fn signing(mut self, signing: SigningConfig) -> Self {
        self.0.signing.replace(signing);
        self
    }

    /// Sets [`PackageInputs::workspace`].
    pub fn workspace(mut self, workspace: PathBuf) -> Self {
        self.0.workspace = workspace;
        self
    }

    /// Sets [`PackageInputs::out_dir`].
    pub fn out_dir(mut self, out_dir: PathBuf) -> Self {
        self.0.out_dir = out_dir;
        self
    }

    /// Sets [`PackageInputs::build_log`].
    pub fn build_log(mut self, path: PathBuf) -> Self {
        self.0.build_log.replace(path);
        self
    }

    /// Sets [`PackageInputs::dependency_log`].
    pub fn dependency_log(mut self, path: PathBuf) -> Self {
        self.0.dependency_log.replace(path);
        self
    }

    /// Sets [`Subpackage::base_runtime`].
    pub fn base_runtime<I: IntoIterator<Item = S>, S: Into<String>>(mut self, deps: I) -> Self {
        self.0.subpackage.base_runtime = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Sets [`Subpackage::base_provides`].
    pub fn base_provides<I: IntoIterator<Item = S>, S: Into<String>>(mut self, deps: I) -> Self {
        self.0.subpackage.base_provides = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Sets [`Subpackage::base_replaces`].
    pub fn base_replaces<I: IntoIterator<Item = S>, S: Into<String>>(mut self, deps: I) -> Self {
        self.0.subpackage.base_replaces = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Sets [`Subpackage::provider_priority`].
    pub fn provider_priority(mut self, priority: i64) -> Self {
        self.0.subpackage.provider_priority.replace(priority);
        self
    }

    /// Sets [`Subpackage::scriptlets`].
    pub fn scriptlets(mut self, scriptlets: Scriptlets) -> Self {
        self.0.subpackage.scriptlets = scriptlets;
        self
    }

    /// Sets [`Subpackage::description`].
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.0.subpackage.description.replace(description.into());
        self
    }

    /// Sets [`Subpackage::url`].
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.0.subpackage.url.replace(url.into());
        self
    }

    /// Sets [`Subpackage::commit`].
    pub fn commit(mut self, commit: impl Into<String>) -> Self {
        self.0.subpackage.commit.replace(commit.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_minimal_inputs() {
        let inputs = PackageInputsBuilder::new(
            Origin {
                name: "hello".into(),
                version: "1.0".into(),
                epoch: 0,
                license: vec!["MIT".into()],
            },
            "hello",
            PathBuf::from("/work"),
        )
        .arch("x86_64")
        .out_dir(PathBuf::from("/out"))
        .build();

        assert_eq!(inputs.full_version(), "1.0-r0");
        assert_eq!(inputs.origin_name(), "hello");
        assert_eq!(
            inputs.staging_dir(),
            PathBuf::from("/work/melange-out/hello")
        );
        assert_eq!(
            inputs.output_path(),
            PathBuf::from("/out/hello-1.0-r0.apk")
        );
    }
}
