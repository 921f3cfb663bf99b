//! Run settings: package directory, installer command lines, clone targets.
pub mod toml_loader;

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Default package directory, relative to the working directory.
pub const DEFAULT_PKG_DIR: &str = "packages";
/// Default command line for the system package manager.
pub const DEFAULT_INSTALL_COMMAND: &str = "sudo pacman -Sy";
/// Default command line for the AUR helper.
pub const DEFAULT_AUR_COMMAND: &str = "yay";
/// Default host that repository slugs are appended to.
pub const DEFAULT_REPO_BASE_URL: &str = "https://github.com";
/// Default parent for synthesized clone directories.
pub const DEFAULT_CLONE_ROOT: &str = "/tmp";
/// Default interpreter for command files and post-clone commands.
pub const DEFAULT_SHELL: &str = "bash";
/// Environment variable overriding the package directory.
pub const PKG_DIR_ENV: &str = "PKG_INSTALL_DIR";

/// Settings for one run.
///
/// Every field may be set in the TOML settings file; missing fields keep
/// their defaults and unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory holding the manifests.
    pub pkg_dir: PathBuf,
    /// Base command line for primary packages.
    pub install_command: String,
    /// Base command line for AUR packages.
    pub aur_command: String,
    /// Host URL that repository slugs are joined to.
    pub repo_base_url: String,
    /// Parent directory for clones without an explicit target.
    pub clone_root: PathBuf,
    /// Shell used for command files and post-clone commands.
    pub shell: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pkg_dir: PathBuf::from(DEFAULT_PKG_DIR),
            install_command: DEFAULT_INSTALL_COMMAND.to_string(),
            aur_command: DEFAULT_AUR_COMMAND.to_string(),
            repo_base_url: DEFAULT_REPO_BASE_URL.to_string(),
            clone_root: PathBuf::from(DEFAULT_CLONE_ROOT),
            shell: DEFAULT_SHELL.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `explicit`, or from the default settings file if
    /// it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing, or if any settings
    /// file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => toml_loader::load_config(path, true),
            None => default_config_path()
                .map_or_else(|| Ok(Self::default()), |p| toml_loader::load_config(&p, false)),
        }
    }

    /// Apply the package directory override chain and anchor a relative
    /// directory at `cwd`.
    ///
    /// Precedence: `cli` > `env` > the loaded value.
    #[must_use]
    pub fn with_pkg_dir(mut self, cli: Option<&Path>, env: Option<PathBuf>, cwd: &Path) -> Self {
        if let Some(dir) = cli {
            self.pkg_dir = dir.to_path_buf();
        } else if let Some(dir) = env {
            self.pkg_dir = dir;
        }
        if self.pkg_dir.is_relative() {
            self.pkg_dir = cwd.join(&self.pkg_dir);
        }
        self
    }

    /// Resolve a manifest name inside the package directory.
    #[must_use]
    pub fn manifest_path(&self, name: &str) -> PathBuf {
        self.pkg_dir.join(name)
    }

    /// Tokens of the primary install command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command line is empty or has unbalanced quotes.
    pub fn install_argv(&self) -> Result<Vec<String>, ConfigError> {
        split_command("install_command", &self.install_command)
    }

    /// Tokens of the AUR install command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command line is empty or has unbalanced quotes.
    pub fn aur_argv(&self) -> Result<Vec<String>, ConfigError> {
        split_command("aur_command", &self.aur_command)
    }
}

/// Split a configured command line into argument tokens using shell-word
/// rules.
///
/// # Errors
///
/// Returns [`ConfigError::EmptyCommand`] if nothing is left to run.
pub fn split_command(key: &'static str, value: &str) -> Result<Vec<String>, ConfigError> {
    shlex::split(value)
        .filter(|tokens| !tokens.is_empty())
        .ok_or_else(|| ConfigError::EmptyCommand {
            key,
            value: value.to_string(),
        })
}

/// `$XDG_CONFIG_HOME/pkg-install/config.toml`, falling back to
/// `~/.config/pkg-install/config.toml`.
fn default_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("pkg-install").join("config.toml"))
}
