// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The cross-package symlink resolver (C5, spec.md §4.5). A pure function
//! over an immutable `{pkg -> staging-root}` map, as spec.md §9 recommends
//! ("no runtime cycle concerns").

use std::{collections::HashMap, path::PathBuf};

use crate::{config::library_dirs, staging::StagedEntry};

/// Resolves a staged `.so*` symlink against sibling package staging trees.
///
/// Keeps only the link target's basename and probes
/// `<staging-root-of-pkg>/<libdir>/<basename>` across the Cartesian product
/// of every candidate package name and library directory, returning the
/// first path that exists on disk. Returns `None` (non-fatal) when no
/// candidate exists.
pub(crate) fn resolve_symlink(
    entry: &StagedEntry,
    staging_roots: &HashMap<String, PathBuf>,
    package_names: &[&str],
) -> Option<PathBuf> {
    let target = entry.link_target.as_ref()?;
    let basename = target.file_name()?;

    for pkg in package_names {
        let Some(root) = staging_roots.get(*pkg) else {
            continue;
        };
        for libdir in library_dirs() {
            let candidate = root.join(libdir).join(basename);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}
