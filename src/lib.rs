//! Declarative package-manifest installer.
//!
//! Reads manifest files from a package directory, follows their `include:`
//! directives, and installs the collected packages with the system package
//! manager and an AUR helper. Two first-line sentinels switch a file into a
//! different mode: `# COMMAND FILE` runs it as a shell script and
//! `# GITHUB FILE` clones the repositories it lists.
//!
//! The public API is organised into layers:
//!
//! - **[`manifest`]**: file modes, directives and the recursive [`manifest::Walker`]
//! - **[`installer`]**: hands the collected [`manifest::PackageSet`] to the package managers
//! - **[`exec`]**: the [`exec::Executor`] seam every subprocess goes through
//! - **[`commands`]**: argument handling and orchestration for the binary
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod installer;
pub mod interrupt;
pub mod logging;
pub mod manifest;

/// Version string from the build environment, or `dev-<crate version>`.
#[must_use]
pub fn version() -> &'static str {
    option_env!("PKG_INSTALL_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")))
}
