// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The dependency finisher (C6, spec.md §4.6): merges generator output with
//! user-declared dependencies, sorts and deduplicates, and strips
//! self-provided entries. Modeled as a pure function over plain `Vec<String>`
//! rather than an abstraction, matching spec.md §9's guidance that "a fixed
//! order invocation of two stages matches the source and tests equally well".

use crate::config::{Dependencies, Subpackage};
use crate::elf::GeneratedDependencies;

/// Sorts ASCII-lexicographically and removes duplicates (not just adjacent
/// ones, since the inputs are not pre-sorted when this is called).
fn sorted_unique(mut items: Vec<String>) -> Vec<String> {
    items.sort();
    items.dedup();
    items
}

/// The bare name of a relation string, i.e. the text before the first `=`
/// (spec.md §3, §4.6: `providedBareNames = { s.split('=')[0] : s in Provides }`).
fn bare_name(relation: &str) -> &str {
    relation.split('=').next().unwrap_or(relation)
}

/// Runs C6: merges `generated` with the subpackage's user-declared
/// dependencies, then sorts/dedupes/strips self-provisions.
pub(crate) fn finish(subpackage: &Subpackage, generated: GeneratedDependencies) -> Dependencies {
    let mut runtime = generated.runtime;
    runtime.extend(subpackage.base_runtime.iter().cloned());

    let mut provides = generated.provides;
    provides.extend(subpackage.base_provides.iter().cloned());

    let provides = sorted_unique(provides);

    let provided_bare_names: std::collections::HashSet<&str> =
        provides.iter().map(|p| bare_name(p)).collect();

    let runtime = sorted_unique(runtime)
        .into_iter()
        .filter(|dep| !provided_bare_names.contains(bare_name(dep)))
        .collect();

    Dependencies {
        runtime,
        provides,
        replaces: subpackage.base_replaces.clone(),
        provider_priority: subpackage.provider_priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Scriptlets;

    fn subpackage(base_runtime: &[&str], base_provides: &[&str]) -> Subpackage {
        Subpackage {
            name: "pkg".into(),
            base_runtime: base_runtime.iter().map(|s| s.to_string()).collect(),
            base_provides: base_provides.iter().map(|s| s.to_string()).collect(),
            base_replaces: Vec::new(),
            provider_priority: None,
            scriptlets: Scriptlets::default(),
            description: None,
            url: None,
            commit: None,
        }
    }

    #[test]
    fn sorts_and_dedupes() {
        let generated = GeneratedDependencies {
            runtime: vec!["so:b".into(), "so:a".into(), "so:a".into()],
            provides: Vec::new(),
            consumers: Default::default(),
        };
        let deps = finish(&subpackage(&[], &[]), generated);
        assert_eq!(deps.runtime, vec!["so:a".to_string(), "so:b".to_string()]);
    }

    #[test]
    fn self_provision_is_removed() {
        let generated = GeneratedDependencies {
            runtime: vec!["so:libfoo.so.1".into(), "so:libc.musl-x86_64.so.1".into()],
            provides: vec!["so:libfoo.so.1=1".into()],
            consumers: Default::default(),
        };
        let deps = finish(&subpackage(&[], &[]), generated);
        assert_eq!(deps.provides, vec!["so:libfoo.so.1=1".to_string()]);
        assert_eq!(
            deps.runtime,
            vec!["so:libc.musl-x86_64.so.1".to_string()]
        );
    }

    #[test]
    fn merges_user_declared_dependencies() {
        let generated = GeneratedDependencies {
            runtime: vec!["so:libfoo.so.1".into()],
            provides: Vec::new(),
            consumers: Default::default(),
        };
        let deps = finish(&subpackage(&["bar>=1.0"], &["cmd:baz=1.0-r0"]), generated);
        assert_eq!(
            deps.runtime,
            vec!["bar>=1.0".to_string(), "so:libfoo.so.1".to_string()]
        );
        assert_eq!(deps.provides, vec!["cmd:baz=1.0-r0".to_string()]);
    }
}
