// Copyright 2023-2023 CrabNebula Ltd.
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The command-provider scanner (C4, spec.md §4.3): records `cmd:*=VER`
//! provides for executables staged under the conventional bin directories.

use crate::{
    config::{command_dir_prefixes, Options},
    elf::GeneratedDependencies,
    staging::StagingView,
};

/// Runs C4 over the whole staging view, appending `cmd:<basename>=<version>`
/// entries to `deps.provides` for every executable under `bin/`, `sbin/`,
/// `usr/bin/` or `usr/sbin/`. Suppressed entirely when `no_commands` is set.
pub(crate) fn scan(
    view: &StagingView,
    version: &str,
    options: &Options,
    deps: &mut GeneratedDependencies,
) -> crate::Result<()> {
    if options.no_commands {
        return Ok(());
    }

    for entry in view.entries()? {
        if !entry.is_executable() {
            continue;
        }
        if command_dir_prefixes()
            .iter()
            .any(|prefix| entry.rel_path.starts_with(prefix))
        {
            deps.provides
                .push(format!("cmd:{}={version}", entry.basename()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    #[test]
    fn records_command_provider() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("usr/bin")).unwrap();
        let bin = dir.path().join("usr/bin/hello");
        fs::write(&bin, b"elf-bytes").unwrap();
        fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();

        let view = crate::staging::StagingView::new(dir.path().to_path_buf()).unwrap();
        let mut deps = GeneratedDependencies::default();
        scan(&view, "1.0-r0", &Options::default(), &mut deps).unwrap();

        assert_eq!(deps.provides, vec!["cmd:hello=1.0-r0".to_string()]);
    }

    #[test]
    fn no_commands_suppresses_scanning() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("usr/bin")).unwrap();
        let bin = dir.path().join("usr/bin/hello");
        fs::write(&bin, b"elf-bytes").unwrap();
        fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();

        let view = crate::staging::StagingView::new(dir.path().to_path_buf()).unwrap();
        let mut deps = GeneratedDependencies::default();
        let options = Options {
            no_commands: true,
            ..Default::default()
        };
        scan(&view, "1.0-r0", &options, &mut deps).unwrap();

        assert!(deps.provides.is_empty());
    }
}
