//! File mode detection from the first line.

/// First line marking a file as a shell script.
pub const COMMAND_SENTINEL: &str = "# COMMAND FILE";
/// First line marking a file as a repository list.
pub const REPO_LIST_SENTINEL: &str = "# GITHUB FILE";

/// How a manifest file is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Run the whole file as a shell script.
    Command,
    /// Clone the repositories listed after the sentinel.
    RepoList,
    /// Parse line by line as directives.
    Plain,
}

impl FileMode {
    /// Classify a file by its first line.
    ///
    /// Surrounding whitespace is ignored and the sentinel only has to be a
    /// prefix, so `# COMMAND FILE (run as root)` still selects
    /// [`FileMode::Command`].
    ///
    /// # Examples
    ///
    /// ```
    /// use pkg_install::manifest::FileMode;
    ///
    /// assert_eq!(FileMode::detect("# GITHUB FILE"), FileMode::RepoList);
    /// assert_eq!(FileMode::detect("# plain comment"), FileMode::Plain);
    /// ```
    #[must_use]
    pub fn detect(first_line: &str) -> Self {
        let line = first_line.trim();
        if line.starts_with(COMMAND_SENTINEL) {
            Self::Command
        } else if line.starts_with(REPO_LIST_SENTINEL) {
            Self::RepoList
        } else {
            Self::Plain
        }
    }
}

impl std::fmt::Display for FileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Command => write!(f, "command file"),
            Self::RepoList => write!(f, "repository list"),
            Self::Plain => write!(f, "package file"),
        }
    }
}
