//! Repository lists: parsing entries and naming clone targets.
use std::path::{Path, PathBuf};

/// One repository to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoEntry {
    /// `owner/name` appended to the base URL.
    pub slug: String,
    /// Clone target; empty means "synthesize one".
    pub dir: String,
    /// Command to run inside the clone; empty means none.
    pub post_command: String,
}

/// Group the lines after the sentinel into entries of three.
///
/// A short final group is padded with empty fields. Each field is trimmed.
#[must_use]
pub fn parse_entries<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<RepoEntry> {
    let mut lines = lines.into_iter().map(str::trim);
    let mut entries = Vec::new();
    while let Some(slug) = lines.next() {
        entries.push(RepoEntry {
            slug: slug.to_string(),
            dir: lines.next().unwrap_or_default().to_string(),
            post_command: lines.next().unwrap_or_default().to_string(),
        });
    }
    entries
}

/// Join a slug to the base URL with exactly one `/`.
#[must_use]
pub fn clone_url(base: &str, slug: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        slug.trim_start_matches('/')
    )
}

/// Expand a leading `~` or `~/` against `home`.
#[must_use]
pub fn expand_home(dir: &str, home: Option<&Path>) -> PathBuf {
    match (dir.strip_prefix('~'), home) {
        (Some(""), Some(home)) => home.to_path_buf(),
        (Some(rest), Some(home)) if rest.starts_with('/') => {
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(dir),
    }
}

/// Names clone directories `pkg-install-<unix seconds>` under a root.
///
/// A second request within the same second gets a `-<n>` suffix so two
/// entries without a directory never share one.
#[derive(Debug, Default)]
pub struct TempDirNamer {
    last: Option<(i64, u32)>,
}

impl TempDirNamer {
    /// Create a namer with no history.
    #[must_use]
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Name the next directory under `root` for the given timestamp.
    pub fn next(&mut self, root: &Path, timestamp: i64) -> PathBuf {
        let seq = match self.last {
            Some((ts, seq)) if ts == timestamp => seq + 1,
            _ => 0,
        };
        self.last = Some((timestamp, seq));
        if seq == 0 {
            root.join(format!("pkg-install-{timestamp}"))
        } else {
            root.join(format!("pkg-install-{timestamp}-{seq}"))
        }
    }

    /// Name the next directory under `root` using the current time.
    pub fn next_now(&mut self, root: &Path) -> PathBuf {
        self.next(root, chrono::Utc::now().timestamp())
    }
}
