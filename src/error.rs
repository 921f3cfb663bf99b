//! Domain-specific error types for the manifest installer.
//!
//! Internal modules return typed errors ([`ManifestError`], [`ConfigError`])
//! while the command handler at the CLI boundary converts them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! Subprocess failures have no variant here. They are logged and recorded in
//! the run summary.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a manifest walk.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// A manifest could not be opened or read.
    #[error("cannot read manifest {}: {source}", path.display())]
    Read {
        /// Resolved path of the manifest.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A manifest includes itself, directly or through other manifests.
    #[error("include cycle detected: {chain}")]
    IncludeCycle {
        /// The include chain, rendered as `a → b → a`.
        chain: String,
    },
}

/// Errors that arise from loading settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("cannot read config file {}: {source}", path.display())]
    Io {
        /// Path to the settings file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The settings file is not valid TOML or contains unknown keys.
    #[error("invalid config file {}: {source}", path.display())]
    Parse {
        /// Path to the settings file.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// A configured command line has no program to run.
    #[error("setting '{key}' must name a program, got {value:?}")]
    EmptyCommand {
        /// Name of the setting.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
}
