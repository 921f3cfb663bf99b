//! Recursive manifest traversal.
//!
//! The [`Walker`] reads each manifest's first line to pick its
//! [`FileMode`], then either runs it, clones the repositories it lists, or
//! folds its directives into a [`PackageSet`]. `include:` lines recurse
//! depth-first at the point they appear.
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead as _, BufReader};
use std::path::{Path, PathBuf};

use super::directive::{self, Directive};
use super::mode::FileMode;
use super::packages::PackageSet;
use super::repo_list::{self, RepoEntry, TempDirNamer};
use crate::config::Settings;
use crate::error::ManifestError;
use crate::exec::{self, Executor};
use crate::logging::{Log, StepStatus};

/// Program used for repository clones.
const GIT: &str = "git";

/// Walks manifests and accumulates the packages they request.
pub struct Walker<'a> {
    settings: &'a Settings,
    executor: &'a dyn Executor,
    log: &'a dyn Log,
    packages: PackageSet,
    /// Manifests currently being read, outermost first.
    chain: Vec<PathBuf>,
    temp_dirs: TempDirNamer,
    home: Option<PathBuf>,
}

impl fmt::Debug for Walker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Walker")
            .field("pkg_dir", &self.settings.pkg_dir)
            .field("packages", &self.packages)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

impl<'a> Walker<'a> {
    /// Create a walker resolving manifest names under `settings.pkg_dir`.
    ///
    /// `~` in clone targets expands against `$HOME`.
    #[must_use]
    pub fn new(settings: &'a Settings, executor: &'a dyn Executor, log: &'a dyn Log) -> Self {
        Self {
            settings,
            executor,
            log,
            packages: PackageSet::new(),
            chain: Vec::new(),
            temp_dirs: TempDirNamer::new(),
            home: std::env::var_os("HOME").map(PathBuf::from),
        }
    }

    /// Override the home directory used for `~` expansion.
    #[must_use]
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// Consume the walker, returning the accumulated packages.
    #[must_use]
    pub fn finish(self) -> PackageSet {
        self.packages
    }

    /// Process manifests in order.
    ///
    /// Subprocess failures are logged and recorded, never returned.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Read`] if any manifest (top-level or
    /// included) cannot be read, and [`ManifestError::IncludeCycle`] if a
    /// manifest includes itself directly or transitively. Either aborts the
    /// whole walk.
    pub fn walk<S: AsRef<str>>(&mut self, names: &[S]) -> Result<(), ManifestError> {
        for name in names {
            let path = self.settings.manifest_path(name.as_ref());
            self.process_file(&path)?;
        }
        Ok(())
    }

    fn process_file(&mut self, path: &Path) -> Result<(), ManifestError> {
        self.log.info(&format!("FILE: {}", path.display()));
        if self.chain.iter().any(|p| p == path) {
            return Err(ManifestError::IncludeCycle {
                chain: self.describe_cycle(path),
            });
        }

        let mode = FileMode::detect(&read_first_line(path)?);
        self.log.debug(&format!("{}: {mode}", path.display()));

        self.chain.push(path.to_path_buf());
        let result = match mode {
            FileMode::Command => {
                self.run_command_file(path);
                Ok(())
            }
            FileMode::RepoList => self.process_repo_list(path),
            FileMode::Plain => self.process_plain(path),
        };
        self.chain.pop();
        result
    }

    fn process_plain(&mut self, path: &Path) -> Result<(), ManifestError> {
        self.log.info(&format!("PACKAGE FILE: {}", path.display()));
        let content = read_to_string(path)?;
        for directive in directive::parse(&content) {
            match directive {
                Directive::Comment(text) => self.log.debug(&format!("COMMENT: {text}")),
                Directive::Include(names) => {
                    self.log.info(&format!("INCLUDE: {}", names.join(" ")));
                    self.walk(&names)?;
                }
                Directive::AurPackages(names) => {
                    self.log.debug(&format!("AUR: {}", names.join(" ")));
                    self.packages.extend_aur(names);
                }
                Directive::Packages(names) => {
                    self.log.debug(&format!("PACKAGES: {}", names.join(" ")));
                    self.packages.extend_primary(names);
                }
            }
        }
        Ok(())
    }

    fn run_command_file(&self, path: &Path) {
        self.log.info(&format!("COMMAND FILE: {}", path.display()));
        let script = path.to_string_lossy();
        let outcome = self.executor.run(&self.settings.shell, &[&*script]);
        exec::record_outcome(
            self.log,
            self.executor,
            &format!("command file {}", path.display()),
            outcome,
        );
    }

    fn process_repo_list(&mut self, path: &Path) -> Result<(), ManifestError> {
        self.log.info(&format!("REPOSITORY LIST: {}", path.display()));
        let content = read_to_string(path)?;
        for entry in repo_list::parse_entries(content.lines().skip(1)) {
            self.clone_repo(&entry);
        }
        Ok(())
    }

    fn clone_repo(&mut self, entry: &RepoEntry) {
        if entry.slug.is_empty() {
            self.log.warn("skipping repository entry without a slug");
            self.log
                .record_step("clone", StepStatus::Skipped, Some("empty repository slug"));
            return;
        }

        let dir = if entry.dir.is_empty() {
            let dir = self.temp_dirs.next_now(&self.settings.clone_root);
            self.log
                .info(&format!("No repo directory given, using {}", dir.display()));
            dir
        } else {
            repo_list::expand_home(&entry.dir, self.home.as_deref())
        };

        let url = repo_list::clone_url(&self.settings.repo_base_url, &entry.slug);
        self.log
            .info(&format!("Cloning {url} into {}...", dir.display()));
        let target = dir.to_string_lossy();
        let outcome = self.executor.run(GIT, &["clone", &url, &target]);
        let cloned = exec::record_outcome(
            self.log,
            self.executor,
            &format!("clone {}", entry.slug),
            outcome,
        );

        if entry.post_command.is_empty() {
            return;
        }
        let step = format!("post-clone {}", entry.slug);
        let skip_reason = match cloned {
            StepStatus::Ok | StepStatus::DryRun => None,
            StepStatus::Failed if dir.is_dir() => None,
            StepStatus::Failed => Some(format!("{} does not exist", dir.display())),
            StepStatus::Cancelled | StepStatus::Skipped => Some("clone did not finish".to_string()),
        };
        if let Some(reason) = skip_reason {
            self.log
                .warn(&format!("skipping post-clone command for {}: {reason}", entry.slug));
            self.log.record_step(&step, StepStatus::Skipped, Some(&reason));
            return;
        }

        self.log.info(&format!(
            "Running '{}' in {}",
            entry.post_command,
            dir.display()
        ));
        let outcome =
            self.executor
                .run_in(&dir, &self.settings.shell, &["-c", &entry.post_command]);
        exec::record_outcome(self.log, self.executor, &step, outcome);
    }

    /// Render the include chain from the first visit of `repeated` back to it.
    fn describe_cycle(&self, repeated: &Path) -> String {
        let start = self
            .chain
            .iter()
            .position(|p| p == repeated)
            .unwrap_or_default();
        self.chain
            .iter()
            .skip(start)
            .map(PathBuf::as_path)
            .chain(std::iter::once(repeated))
            .map(display_name)
            .collect::<Vec<_>>()
            .join(" → ")
    }
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

fn read_error(path: &Path) -> impl FnOnce(io::Error) -> ManifestError + '_ {
    move |source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    }
}

/// Read only the first line; the handle is closed on return.
fn read_first_line(path: &Path) -> Result<String, ManifestError> {
    let file = File::open(path).map_err(read_error(path))?;
    let mut line = String::new();
    BufReader::new(file)
        .read_line(&mut line)
        .map_err(read_error(path))?;
    Ok(line)
}

fn read_to_string(path: &Path) -> Result<String, ManifestError> {
    std::fs::read_to_string(path).map_err(read_error(path))
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::exec::ExecStatus;
    use crate::exec::test_helpers::RecordingExecutor;
    use crate::logging::test_helpers::RecordingLog;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        settings: Settings,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().expect("tempdir");
            let settings = Settings {
                pkg_dir: dir.path().join("packages"),
                clone_root: dir.path().join("clones"),
                ..Settings::default()
            };
            std::fs::create_dir_all(&settings.pkg_dir).expect("pkg dir");
            Self { dir, settings }
        }

        fn write(&self, name: &str, content: &str) -> &Self {
            std::fs::write(self.settings.pkg_dir.join(name), content).expect("write manifest");
            self
        }

        fn path(&self, name: &str) -> PathBuf {
            self.settings.pkg_dir.join(name)
        }
    }

    fn walk(
        fx: &Fixture,
        exec: &RecordingExecutor,
        log: &RecordingLog,
        names: &[&str],
    ) -> (Result<(), ManifestError>, PackageSet) {
        let mut walker = Walker::new(&fx.settings, exec, log);
        let result = walker.walk(names);
        (result, walker.finish())
    }

    #[test]
    fn comment_only_manifest_accumulates_nothing() {
        let fx = Fixture::new();
        fx.write("notes", "# just notes\n\n   \n#more\n");
        let (exec, log) = (RecordingExecutor::new(), RecordingLog::default());
        let (result, packages) = walk(&fx, &exec, &log, &["notes"]);
        result.unwrap();
        assert!(packages.is_empty());
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn include_resolves_depth_first() {
        let fx = Fixture::new();
        fx.write("a", "a1\ninclude: c\n")
            .write("b", "b1\n")
            .write("c", "c1\n")
            .write("main", "m1\ninclude: a b\nm2\n");
        let (exec, log) = (RecordingExecutor::new(), RecordingLog::default());
        let (result, packages) = walk(&fx, &exec, &log, &["main"]);
        result.unwrap();
        assert_eq!(packages.primary, ["m1", "a1", "c1", "b1", "m2"]);

        let files: Vec<String> = log
            .messages()
            .into_iter()
            .filter_map(|m| m.strip_prefix("info: FILE: ").map(str::to_string))
            .collect();
        let expected: Vec<String> = ["main", "a", "c", "b"]
            .iter()
            .map(|n| fx.path(n).display().to_string())
            .collect();
        assert_eq!(files, expected);
    }

    #[test]
    fn aur_and_primary_accumulate_independently() {
        let fx = Fixture::new();
        fx.write("mixed", "aur: qux\nfoo bar baz\n");
        let (exec, log) = (RecordingExecutor::new(), RecordingLog::default());
        let (result, packages) = walk(&fx, &exec, &log, &["mixed"]);
        result.unwrap();
        assert_eq!(packages.primary, ["foo", "bar", "baz"]);
        assert_eq!(packages.aur, ["qux"]);
    }

    #[test]
    fn manifest_included_twice_appends_twice() {
        let fx = Fixture::new();
        fx.write("base", "git\n").write("twice", "include: base base\n");
        let (exec, log) = (RecordingExecutor::new(), RecordingLog::default());
        let (result, packages) = walk(&fx, &exec, &log, &["twice"]);
        result.unwrap();
        assert_eq!(packages.primary, ["git", "git"]);
    }

    #[test]
    fn extra_includes_base() {
        let fx = Fixture::new();
        fx.write("base", "git vim\n")
            .write("extra", "include: base\naur: yay-helper-pkg\n");
        let (exec, log) = (RecordingExecutor::new(), RecordingLog::default());
        let (result, packages) = walk(&fx, &exec, &log, &["extra"]);
        result.unwrap();
        assert_eq!(packages.primary, ["git", "vim"]);
        assert_eq!(packages.aur, ["yay-helper-pkg"]);
    }

    #[test]
    fn directives_are_traced_at_debug() {
        let fx = Fixture::new();
        fx.write("base", "# editors\nvim\naur: paru\n");
        let (exec, log) = (RecordingExecutor::new(), RecordingLog::default());
        walk(&fx, &exec, &log, &["base"]).0.unwrap();
        let messages = log.messages();
        assert!(messages.contains(&"debug: COMMENT: editors".to_string()));
        assert!(messages.contains(&"debug: PACKAGES: vim".to_string()));
        assert!(messages.contains(&"debug: AUR: paru".to_string()));
    }

    #[test]
    fn failing_command_file_does_not_stop_next_manifest() {
        let fx = Fixture::new();
        fx.write("setup", "# COMMAND FILE\nexit 1\n").write("base", "git\n");
        let exec = RecordingExecutor::with_statuses(vec![ExecStatus::Failed(Some(1))]);
        let log = RecordingLog::default();
        let (result, packages) = walk(&fx, &exec, &log, &["setup", "base"]);
        result.unwrap();
        assert_eq!(packages.primary, ["git"]);

        let calls = exec.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "bash");
        assert_eq!(calls[0].args, [fx.path("setup").display().to_string()]);

        let steps = log.steps();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].status, StepStatus::Failed);
        assert_eq!(steps[0].message.as_deref(), Some("exit 1"));
    }

    #[test]
    fn cancelled_command_file_continues_walk() {
        let fx = Fixture::new();
        fx.write("setup", "# COMMAND FILE\nsleep 100\n")
            .write("base", "git\n");
        let exec = RecordingExecutor::with_statuses(vec![ExecStatus::Cancelled]);
        let log = RecordingLog::default();
        let (result, packages) = walk(&fx, &exec, &log, &["setup", "base"]);
        result.unwrap();
        assert_eq!(packages.primary, ["git"]);
        assert_eq!(log.steps()[0].status, StepStatus::Cancelled);
    }

    #[test]
    fn command_file_uses_configured_shell() {
        let mut fx = Fixture::new();
        fx.settings.shell = "zsh".to_string();
        fx.write("setup", "  # COMMAND FILE  \necho hi\n");
        let (exec, log) = (RecordingExecutor::new(), RecordingLog::default());
        walk(&fx, &exec, &log, &["setup"]).0.unwrap();
        assert_eq!(exec.calls()[0].program, "zsh");
        assert_eq!(log.steps()[0].status, StepStatus::Ok);
    }

    #[test]
    fn repo_without_dir_clones_into_timestamped_temp_path() {
        let fx = Fixture::new();
        fx.write("repos", "# GITHUB FILE\nowner/tool\n\n\n");
        let (exec, log) = (RecordingExecutor::new(), RecordingLog::default());
        let before = chrono::Utc::now().timestamp();
        walk(&fx, &exec, &log, &["repos"]).0.unwrap();
        let after = chrono::Utc::now().timestamp();

        let calls = exec.calls();
        assert_eq!(calls.len(), 1, "no post-clone command expected");
        assert_eq!(calls[0].program, "git");
        assert_eq!(calls[0].args[0], "clone");
        assert_eq!(calls[0].args[1], "https://github.com/owner/tool");

        let target = PathBuf::from(&calls[0].args[2]);
        assert_eq!(target.parent(), Some(fx.settings.clone_root.as_path()));
        let stamp: i64 = target
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix("pkg-install-"))
            .expect("pkg-install- prefix")
            .parse()
            .expect("unix timestamp");
        assert!((before..=after).contains(&stamp));
        assert!(
            log.messages()
                .iter()
                .any(|m| m.starts_with("info: No repo directory given"))
        );
    }

    #[test]
    fn two_entries_without_dir_get_distinct_targets() {
        let fx = Fixture::new();
        fx.write("repos", "# GITHUB FILE\nowner/a\n\n\nowner/b\n\n\n");
        let (exec, log) = (RecordingExecutor::new(), RecordingLog::default());
        walk(&fx, &exec, &log, &["repos"]).0.unwrap();
        let calls = exec.calls();
        assert_eq!(calls.len(), 2);
        assert_ne!(calls[0].args[2], calls[1].args[2]);
    }

    #[test]
    fn post_clone_command_runs_in_target_dir() {
        let fx = Fixture::new();
        fx.write(
            "repos",
            "# GITHUB FILE\nowner/tool\n/opt/tool\nmake install\n",
        );
        let (exec, log) = (RecordingExecutor::new(), RecordingLog::default());
        walk(&fx, &exec, &log, &["repos"]).0.unwrap();
        let calls = exec.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].args, ["clone", "https://github.com/owner/tool", "/opt/tool"]);
        assert_eq!(calls[1].dir.as_deref(), Some(Path::new("/opt/tool")));
        assert_eq!(calls[1].program, "bash");
        assert_eq!(calls[1].args, ["-c", "make install"]);
        let names: Vec<String> = log.steps().into_iter().map(|s| s.name).collect();
        assert_eq!(names, ["clone owner/tool", "post-clone owner/tool"]);
    }

    #[test]
    fn post_clone_command_skipped_after_cancelled_clone() {
        let fx = Fixture::new();
        fx.write("repos", "# GITHUB FILE\nowner/tool\n/opt/tool\nmake\n");
        let exec = RecordingExecutor::with_statuses(vec![ExecStatus::Cancelled]);
        let log = RecordingLog::default();
        walk(&fx, &exec, &log, &["repos"]).0.unwrap();
        assert_eq!(exec.calls().len(), 1);
        let steps = log.steps();
        assert_eq!(steps[1].status, StepStatus::Skipped);
    }

    #[test]
    fn post_clone_command_runs_over_existing_checkout() {
        let fx = Fixture::new();
        let existing = fx.dir.path().join("checkout");
        std::fs::create_dir(&existing).unwrap();
        fx.write(
            "repos",
            &format!("# GITHUB FILE\nowner/tool\n{}\nmake\n", existing.display()),
        );
        let exec = RecordingExecutor::with_statuses(vec![ExecStatus::Failed(Some(128))]);
        let log = RecordingLog::default();
        walk(&fx, &exec, &log, &["repos"]).0.unwrap();
        let calls = exec.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].dir.as_deref(), Some(existing.as_path()));
    }

    #[test]
    fn post_clone_command_skipped_when_failed_clone_left_nothing() {
        let fx = Fixture::new();
        let missing = fx.dir.path().join("missing");
        fx.write(
            "repos",
            &format!("# GITHUB FILE\nowner/tool\n{}\nmake\n", missing.display()),
        );
        let exec = RecordingExecutor::with_statuses(vec![ExecStatus::Failed(Some(128))]);
        let log = RecordingLog::default();
        walk(&fx, &exec, &log, &["repos"]).0.unwrap();
        assert_eq!(exec.calls().len(), 1);
        assert!(
            log.messages()
                .iter()
                .any(|m| m.starts_with("warn: skipping post-clone command for owner/tool"))
        );
    }

    #[test]
    fn entry_without_slug_is_skipped() {
        let fx = Fixture::new();
        fx.write("repos", "# GITHUB FILE\nowner/a\n/src/a\n\n\n");
        let (exec, log) = (RecordingExecutor::new(), RecordingLog::default());
        walk(&fx, &exec, &log, &["repos"]).0.unwrap();
        assert_eq!(exec.calls().len(), 1);
        assert!(
            log.messages()
                .contains(&"warn: skipping repository entry without a slug".to_string())
        );
    }

    #[test]
    fn tilde_target_expands_against_home() {
        let fx = Fixture::new();
        fx.write("repos", "# GITHUB FILE\nowner/tool\n~/src/tool\n");
        let (exec, log) = (RecordingExecutor::new(), RecordingLog::default());
        let mut walker =
            Walker::new(&fx.settings, &exec, &log).with_home(Some(PathBuf::from("/home/me")));
        walker.walk(&["repos"]).unwrap();
        assert_eq!(exec.calls()[0].args[2], "/home/me/src/tool");
    }

    #[test]
    fn repo_list_does_not_accumulate_packages() {
        let fx = Fixture::new();
        fx.write("repos", "# GITHUB FILE\nowner/tool\n/opt/tool\n");
        let (exec, log) = (RecordingExecutor::new(), RecordingLog::default());
        let (result, packages) = walk(&fx, &exec, &log, &["repos"]);
        result.unwrap();
        assert!(packages.is_empty());
    }

    #[test]
    fn missing_manifest_is_a_read_error() {
        let fx = Fixture::new();
        let (exec, log) = (RecordingExecutor::new(), RecordingLog::default());
        let (result, _) = walk(&fx, &exec, &log, &["nope"]);
        match result {
            Err(ManifestError::Read { path, .. }) => assert_eq!(path, fx.path("nope")),
            other => panic!("expected read error, got {other:?}"),
        }
    }

    #[test]
    fn missing_include_aborts_remaining_walk() {
        let fx = Fixture::new();
        fx.write("main", "git\ninclude: gone\nvim\n")
            .write("later", "htop\n");
        let (exec, log) = (RecordingExecutor::new(), RecordingLog::default());
        let (result, packages) = walk(&fx, &exec, &log, &["main", "later"]);
        assert!(matches!(result, Err(ManifestError::Read { .. })));
        assert_eq!(packages.primary, ["git"]);
    }

    #[test]
    fn self_include_is_a_cycle() {
        let fx = Fixture::new();
        fx.write("loop", "include: loop\n");
        let (exec, log) = (RecordingExecutor::new(), RecordingLog::default());
        let (result, _) = walk(&fx, &exec, &log, &["loop"]);
        match result {
            Err(ManifestError::IncludeCycle { chain }) => assert_eq!(chain, "loop → loop"),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn transitive_include_cycle_names_the_chain() {
        let fx = Fixture::new();
        fx.write("main", "include: a\n")
            .write("a", "include: b\n")
            .write("b", "include: a\n");
        let (exec, log) = (RecordingExecutor::new(), RecordingLog::default());
        let (result, _) = walk(&fx, &exec, &log, &["main"]);
        match result {
            Err(ManifestError::IncludeCycle { chain }) => assert_eq!(chain, "a → b → a"),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn sibling_includes_are_not_a_cycle() {
        let fx = Fixture::new();
        fx.write("base", "git\n")
            .write("a", "include: base\n")
            .write("main", "include: a base\n");
        let (exec, log) = (RecordingExecutor::new(), RecordingLog::default());
        let (result, packages) = walk(&fx, &exec, &log, &["main"]);
        result.unwrap();
        assert_eq!(packages.primary, ["git", "git"]);
    }
}
