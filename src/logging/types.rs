//! Core logging types: step entries, status, and the [`Log`] trait.

/// Outcome of one side-effecting step, kept for the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepEntry {
    /// Human-readable step name (e.g. `command file packages/setup`).
    pub name: String,
    /// Final status of the step.
    pub status: StepStatus,
    /// Optional detail message (e.g. exit code).
    pub message: Option<String>,
}

/// Status of a completed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// The subprocess exited successfully.
    Ok,
    /// The subprocess failed or could not be started.
    Failed,
    /// The user interrupted the subprocess.
    Cancelled,
    /// The step was only printed (dry run).
    DryRun,
    /// The step did not run (e.g. nothing to install, empty slug).
    Skipped,
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) is the production implementation; the
/// manifest walker and installers only see this trait so tests can capture
/// the message stream.
pub trait Log {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (suppressed on console unless verbose).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a command that would have run.
    fn dry_run(&self, msg: &str);
    /// Record a step result for the summary.
    fn record_step(&self, name: &str, status: StepStatus, message: Option<&str>);
}
