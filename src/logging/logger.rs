//! Structured logger with step recording and a run summary.
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{Log, StepEntry, StepStatus};
use super::utils::log_file_path;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with step recording.
///
/// Messages go through `tracing`; the subscriber installed by
/// [`init_subscriber`](super::subscriber::init_subscriber) writes them to the
/// console and to `$XDG_CACHE_HOME/pkg-install/<command>.log`.
#[derive(Debug)]
pub struct Logger {
    steps: Mutex<Vec<StepEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// Only remembers the log file path for the summary; the file itself is
    /// created by the subscriber's file layer.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            steps: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// Return the log file path, if available.
    #[cfg(test)]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Return a clone of all recorded steps.
    #[must_use]
    pub fn steps(&self) -> Vec<StepEntry> {
        self.steps.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message.
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a command that would have run.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Record a step result for the summary.
    pub fn record_step(&self, name: &str, status: StepStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.steps.lock() {
            guard.push(StepEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Count the steps that failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.steps.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|s| s.status == StepStatus::Failed)
                .count()
        })
    }

    /// Print the summary of all recorded steps.
    pub fn print_summary(&self) {
        let steps = self.steps();
        if steps.is_empty() {
            return;
        }

        self.stage("Summary");

        let failed = self.failure_count();
        let mut ok = 0usize;
        let mut cancelled = 0usize;
        let mut dry_run = 0usize;
        let mut skipped = 0usize;

        for step in &steps {
            let (icon, color) = match step.status {
                StepStatus::Ok => {
                    ok += 1;
                    ("✓", "\x1b[32m")
                }
                StepStatus::Failed => ("✗", "\x1b[31m"),
                StepStatus::Cancelled => {
                    cancelled += 1;
                    ("○", "\x1b[33m")
                }
                StepStatus::DryRun => {
                    dry_run += 1;
                    ("~", "\x1b[37m")
                }
                StepStatus::Skipped => {
                    skipped += 1;
                    ("·", "\x1b[2m")
                }
            };

            let suffix = step
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", step.name));
        }

        let total = ok + failed + cancelled + dry_run + skipped;
        self.info(&format!(
            "{total} steps: \x1b[32m{ok} ok\x1b[0m, \x1b[31m{failed} failed\x1b[0m, \x1b[33m{cancelled} cancelled\x1b[0m, \x1b[37m{dry_run} dry-run\x1b[0m, \x1b[2m{skipped} skipped\x1b[0m"
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }

        // Failures never change the exit status, so repeat them on stderr.
        match failed {
            0 => {}
            1 => self.warn("1 step failed"),
            n => self.warn(&format!("{n} steps failed")),
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);

    fn record_step(&self, name: &str, status: StepStatus, message: Option<&str>) {
        self.record_step(name, status, message);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::isolated_logger;
    use std::fs;

    #[test]
    fn logger_new() {
        let (log, _tmp, _guard) = isolated_logger();
        assert!(log.steps().is_empty(), "expected empty step list");
    }

    #[test]
    fn record_step_with_message() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_step("clone owner/repo", StepStatus::Failed, Some("exit 128"));
        let steps = log.steps();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].name, "clone owner/repo");
        assert_eq!(steps[0].message, Some("exit 128".to_string()));
    }

    #[test]
    fn failure_count_counts_failed_only() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_step("a", StepStatus::Ok, None);
        log.record_step("b", StepStatus::Failed, Some("exit 1"));
        log.record_step("c", StepStatus::Cancelled, None);
        log.record_step("d", StepStatus::Failed, None);
        assert_eq!(log.failure_count(), 2);
    }

    #[test]
    fn log_trait_delegates_to_logger() {
        let (log, _tmp, _guard) = isolated_logger();
        let log_ref: &dyn Log = &log;
        log_ref.record_step("via-trait", StepStatus::Ok, None);
        assert_eq!(log.steps().len(), 1);
    }

    #[test]
    fn debug_always_written_to_file() {
        let (log, _tmp, _guard) = isolated_logger();
        let marker = format!("debug-marker-{}", std::process::id());
        log.debug(&marker);
        let path = log.log_path().expect("log path should exist");
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("[debug]"));
        assert!(contents.contains(&marker));
    }

    #[test]
    fn stage_written_to_file_with_arrow() {
        let (log, _tmp, _guard) = isolated_logger();
        log.stage("Processing manifests");
        let path = log.log_path().expect("log path");
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("==> Processing manifests"));
    }

    #[test]
    fn dry_run_written_to_file() {
        let (log, _tmp, _guard) = isolated_logger();
        log.dry_run("sudo pacman -Sy git");
        let path = log.log_path().expect("log path");
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("[dry run] sudo pacman -Sy git"));
    }

    #[test]
    fn summary_written_without_ansi_codes() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_step("install packages", StepStatus::Ok, None);
        log.record_step("command file setup", StepStatus::Failed, Some("exit 2"));
        log.print_summary();
        let path = log.log_path().expect("log path");
        let contents = fs::read_to_string(path).unwrap();
        assert!(contents.contains("✗ command file setup (exit 2)"));
        assert!(contents.contains("2 steps: 1 ok, 1 failed"));
        assert!(!contents.contains('\x1b'), "ANSI codes should be stripped");
    }

    #[test]
    fn summary_warns_about_failed_steps() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_step("install packages", StepStatus::Failed, Some("exit 1"));
        log.record_step("clone owner/tool", StepStatus::Failed, Some("exit 128"));
        log.record_step("command file setup", StepStatus::Cancelled, None);
        log.print_summary();
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        assert!(contents.contains("3 steps: 0 ok, 2 failed, 1 cancelled"));
        assert!(contents.contains("[warn] 2 steps failed"));
    }

    #[test]
    fn summary_without_failures_does_not_warn() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_step("install packages", StepStatus::Ok, None);
        log.print_summary();
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        assert!(!contents.contains("[warn]"));
    }
}
