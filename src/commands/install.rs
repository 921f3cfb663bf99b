//! The install command: settings, file selection, walk and install.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::{PKG_DIR_ENV, Settings};
use crate::exec::{DryRunExecutor, Executor, SystemExecutor};
use crate::installer::Installers;
use crate::logging::{Log, Logger};
use crate::manifest::{PackageSet, Walker};

/// Run an install from parsed arguments.
///
/// `cwd` is the working directory captured at startup; a relative package
/// directory is resolved against it.
///
/// # Errors
///
/// Returns an error if the settings cannot be loaded, the package directory
/// cannot be listed, or a manifest cannot be read. Installer and subprocess
/// failures only appear in the summary.
pub fn run(cli: &Cli, cwd: &Path, log: &Logger) -> Result<()> {
    log.info(&format!("pkg-install {}", crate::version()));

    let env_pkg_dir = std::env::var_os(PKG_DIR_ENV).map(PathBuf::from);
    let settings = resolve_settings(cli, cwd, env_pkg_dir)?;
    log.debug(&format!(
        "package directory: {}",
        settings.pkg_dir.display()
    ));

    let system = SystemExecutor;
    let dry_run = DryRunExecutor::new(log);
    let executor: &dyn Executor = if cli.dry_run { &dry_run } else { &system };

    let result = resolve_files(cli, &settings.pkg_dir)
        .and_then(|files| install(&files, &settings, executor, log).map(drop));
    log.print_summary();
    result
}

/// Load settings and apply the package directory overrides.
///
/// # Errors
///
/// Returns an error if the settings file is missing (when given explicitly)
/// or invalid.
pub fn resolve_settings(cli: &Cli, cwd: &Path, env_pkg_dir: Option<PathBuf>) -> Result<Settings> {
    let settings = Settings::load(cli.config.as_deref())?;
    Ok(settings.with_pkg_dir(cli.pkg_dir.as_deref(), env_pkg_dir, cwd))
}

/// Expand the file operands: either the names as given, or every regular
/// file in `pkg_dir` sorted by name.
///
/// # Errors
///
/// Returns an error if `pkg_dir` cannot be listed.
pub fn resolve_files(cli: &Cli, pkg_dir: &Path) -> Result<Vec<String>> {
    if cli.wants_all() {
        list_manifests(pkg_dir)
    } else {
        Ok(cli.files.clone())
    }
}

fn list_manifests(pkg_dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(pkg_dir)
        .with_context(|| format!("cannot list package directory {}", pkg_dir.display()))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("cannot list package directory {}", pkg_dir.display()))?;
        if entry.path().is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// Walk `files`, then install what they requested.
///
/// # Errors
///
/// Returns an error if an installer command line is misconfigured or a
/// manifest cannot be read (including include cycles). In either case no
/// installer runs.
pub fn install(
    files: &[String],
    settings: &Settings,
    executor: &dyn Executor,
    log: &dyn Log,
) -> Result<PackageSet> {
    let installers = Installers::from_settings(settings, executor)?;

    log.stage("Processing manifests");
    let mut walker = Walker::new(settings, executor, log);
    walker.walk(files)?;
    let packages = walker.finish();
    log.info(&format!(
        "collected {} packages, {} AUR packages",
        packages.primary.len(),
        packages.aur.len()
    ));

    if !packages.is_empty() {
        log.stage("Installing packages");
        installers.install(&packages, log);
    }
    Ok(packages)
}
