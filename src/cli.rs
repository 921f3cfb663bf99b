//! Command-line interface.
use clap::Parser;
use std::path::PathBuf;

/// Literal file operand selecting every file in the package directory.
pub const ALL_FILES: &str = "all";

/// Install packages listed in manifest files.
#[derive(Parser, Debug)]
#[command(
    name = "pkg-install",
    about = "Install selected packages using files from a directory",
    version
)]
pub struct Cli {
    /// Manifest files to process, or `all` for every file in the package directory
    #[arg(value_name = "FILE", required_unless_present = "all")]
    pub files: Vec<String>,

    /// Process every file in the package directory
    #[arg(short, long)]
    pub all: bool,

    /// Directory holding the manifest files [default: packages]
    #[arg(short = 'd', long, value_name = "PATH")]
    pub pkg_dir: Option<PathBuf>,

    /// Show directive traces on the console
    #[arg(short, long)]
    pub verbose: bool,

    /// Print commands instead of running them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Settings file [default: $XDG_CONFIG_HOME/pkg-install/config.toml]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Whether every file in the package directory was requested.
    ///
    /// `all` is only special as the sole operand; alongside other names it
    /// is an ordinary manifest name.
    #[must_use]
    pub fn wants_all(&self) -> bool {
        self.all || self.files == [ALL_FILES]
    }

    /// File operands as given, or `all` when `--all` stood in for them.
    #[must_use]
    pub fn operands(&self) -> Vec<String> {
        if self.files.is_empty() && self.all {
            vec![ALL_FILES.to_string()]
        } else {
            self.files.clone()
        }
    }
}
