// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Precomputed, immutable lookup context for one emission: the set of
//! sibling package staging roots the symlink resolver (C5) may probe
//! (spec.md §9: "implement as a pure function over an immutable
//! `{pkg -> staging-root}` map computed once at emission start").

use std::{collections::HashMap, path::PathBuf};

use crate::config::PackageInputs;

pub(crate) struct Context {
    pub(crate) staging_roots: HashMap<String, PathBuf>,
    package_names: Vec<String>,
}

impl Context {
    pub(crate) fn new(inputs: &PackageInputs) -> Self {
        let package_names: Vec<String> = inputs
            .resolvable_package_names()
            .into_iter()
            .map(String::from)
            .collect();
        let staging_roots = package_names
            .iter()
            .map(|name| (name.clone(), inputs.melange_out(name)))
            .collect();
        Self {
            staging_roots,
            package_names,
        }
    }

    pub(crate) fn package_names(&self) -> Vec<&str> {
        self.package_names.iter().map(String::as_str).collect()
    }
}
