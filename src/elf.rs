// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The ELF dependency scanner (C3, spec.md §4.4). Walks the staging view and
//! derives `so:*` runtime requirements and `so:*=VER` provided names from
//! PT_INTERP, DT_NEEDED and DT_SONAME, using `goblin` -- the teacher never
//! parses ELF itself, so this is grounded on `platform-host/src/linux.rs`
//! from the `astral-sh-uv` example, which reads PT_INTERP the same way to
//! fingerprint a host's libc.

use std::collections::HashMap;

use goblin::elf::Elf;

use crate::{
    config::Options,
    resolve::resolve_symlink,
    staging::{EntryKind, StagedEntry, StagingView},
};

/// Accumulated output of C3 and C4, merged by C6 (spec.md §4.6).
#[derive(Debug, Default)]
pub(crate) struct GeneratedDependencies {
    pub(crate) runtime: Vec<String>,
    pub(crate) provides: Vec<String>,
    /// Library SONAME/basename -> consuming staged paths, for the optional
    /// dependency log (spec.md §4.4, §6).
    pub(crate) consumers: HashMap<String, Vec<String>>,
}

/// Rewrites a musl dynamic loader's interpreter name to its library-name
/// equivalent (spec.md §4.4: "the dynamic loader for musl-libc is a
/// self-referential symlink; the dependency must name the loader-equivalent
/// library"), e.g. `so:ld-musl-x86_64.so.1` -> `so:libc.musl-x86_64.so.1`.
fn rewrite_musl_interp(dep: &str) -> String {
    if let Some(rest) = dep.strip_prefix("so:ld-musl") {
        format!("so:libc.musl{rest}")
    } else {
        dep.to_string()
    }
}

/// Extracts the version suffix from a SONAME like `libfoo.so.1.2.3` by
/// splitting on the first `.so.` occurrence (spec.md §4.4); falls back to
/// `0` when there is no `.so.`-delimited suffix. The SONAME itself -- not
/// the part before the split -- is what gets embedded in the `Provides`
/// entry, per spec.md's `so:<soname>=<libver>`.
fn soname_version(soname: &str) -> String {
    match soname.split_once(".so.") {
        Some((_, ver)) => ver.to_string(),
        None => "0".to_string(),
    }
}

fn record_consumer(deps: &mut GeneratedDependencies, lib: &str, consumer_path: &str) {
    deps.consumers
        .entry(lib.to_string())
        .or_default()
        .push(consumer_path.to_string());
}

/// Scans a regular, executable ELF file: PT_INTERP, DT_NEEDED and (when no
/// interpreter is present) DT_SONAME.
fn scan_executable_elf(
    entry: &StagedEntry,
    bytes: &[u8],
    options: &Options,
    deps: &mut GeneratedDependencies,
) -> crate::Result<()> {
    let elf = match Elf::parse(bytes) {
        Ok(elf) => elf,
        // Not a valid ELF (e.g. a shell script with the execute bit set):
        // soft failure, skip (spec.md §4.4, §7 point 2).
        Err(_) => return Ok(()),
    };

    let has_interp = if let Some(interp) = elf.interpreter {
        if !options.no_depends && !interp.is_empty() {
            let basename = interp.rsplit('/').next().unwrap_or(interp);
            let dep = rewrite_musl_interp(&format!("so:{basename}"));
            deps.runtime.push(dep);
        }
        true
    } else {
        false
    };

    if !options.no_depends {
        for needed in &elf.libraries {
            if needed.contains(".so.") {
                deps.runtime.push(format!("so:{needed}"));
                record_consumer(deps, needed, &entry.rel_path);
            }
        }
    }

    // Executables can spuriously carry a SONAME; only non-interpreted
    // (library-shaped) ELF files provide one (spec.md §4.4).
    if !has_interp && !options.no_provides {
        match elf.soname {
            Some(soname) => {
                let ver = soname_version(soname);
                deps.provides.push(format!("so:{soname}={ver}"));
            }
            None => {
                tracing::warn!(path = %entry.rel_path, "executable ELF has no DT_SONAME, skipping provide");
            }
        }
    }

    Ok(())
}

/// Scans a `.so`-named symlink by resolving it against sibling package
/// staging trees and reading the resolved target's DT_SONAME.
fn scan_library_symlink(
    entry: &StagedEntry,
    staging_roots: &HashMap<String, std::path::PathBuf>,
    package_names: &[&str],
    deps: &mut GeneratedDependencies,
) -> crate::Result<()> {
    let Some(resolved) = resolve_symlink(entry, staging_roots, package_names) else {
        return Ok(());
    };

    let bytes = match std::fs::read(&resolved) {
        Ok(bytes) => bytes,
        Err(e) => return Err(crate::Error::ElfRead(resolved, e)),
    };

    let elf = match Elf::parse(&bytes) {
        Ok(elf) => elf,
        Err(_) => return Ok(()),
    };

    match elf.soname {
        Some(soname) => {
            deps.runtime.push(format!("so:{soname}"));
            record_consumer(deps, soname, &entry.rel_path);
        }
        None => {
            tracing::warn!(path = %entry.rel_path, "resolved library symlink has no DT_SONAME, skipping");
        }
    }

    Ok(())
}

/// Runs C3 over the whole staging view, mutating `deps` in place.
#[tracing::instrument(level = "trace", skip(view, staging_roots, deps))]
pub(crate) fn scan(
    view: &StagingView,
    options: &Options,
    staging_roots: &HashMap<String, std::path::PathBuf>,
    package_names: &[&str],
    deps: &mut GeneratedDependencies,
) -> crate::Result<()> {
    for entry in view.entries()? {
        match entry.kind {
            EntryKind::Symlink if entry.rel_path.contains(".so") => {
                scan_library_symlink(&entry, staging_roots, package_names, deps)?;
            }
            EntryKind::File if entry.is_executable() => {
                let bytes = std::fs::read(&entry.abs_path)
                    .map_err(|e| crate::Error::ElfRead(entry.abs_path.clone(), e))?;
                scan_executable_elf(&entry, &bytes, options, deps)?;
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_musl_interpreter() {
        assert_eq!(
            rewrite_musl_interp("so:ld-musl-aarch64.so.1"),
            "so:libc.musl-aarch64.so.1"
        );
        assert_eq!(rewrite_musl_interp("so:libc.so.6"), "so:libc.so.6");
    }

    #[test]
    fn extracts_soname_version() {
        assert_eq!(soname_version("libfoo.so.1.2.3"), "1.2.3");
        assert_eq!(soname_version("libfoo.so"), "0");
        assert_eq!(soname_version("libfoo.so.1"), "1");
    }
}
