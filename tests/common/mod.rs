// Shared helpers for integration tests.
//
// Provides a temporary package directory with a fluent builder, plus
// recording doubles for the executor and log seams, so each integration
// test can drive a full install without spawning package managers.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pkg_install::config::Settings;
use pkg_install::exec::{ExecStatus, Executor};
use pkg_install::logging::{Log, StepEntry, StepStatus};

/// An isolated package directory backed by a [`tempfile::TempDir`].
pub struct IntegrationTestContext {
    /// Temporary directory holding `packages/` and `clones/`.
    pub root: tempfile::TempDir,
    /// Settings pointing into `root`.
    pub settings: Settings,
}

impl IntegrationTestContext {
    /// Create a context with an empty package directory.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let settings = Settings {
            pkg_dir: root.path().join("packages"),
            clone_root: root.path().join("clones"),
            ..Settings::default()
        };
        std::fs::create_dir_all(&settings.pkg_dir).expect("create package dir");
        Self { root, settings }
    }

    /// Path to the package directory.
    pub fn pkg_dir(&self) -> &Path {
        &self.settings.pkg_dir
    }

    /// Path of manifest `name` inside the package directory.
    pub fn manifest(&self, name: &str) -> PathBuf {
        self.settings.pkg_dir.join(name)
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// Begin building a context with an empty package directory.
    pub fn new() -> Self {
        Self {
            ctx: IntegrationTestContext::new(),
        }
    }

    /// Write a manifest into the package directory.
    pub fn with_manifest(self, name: &str, content: &str) -> Self {
        std::fs::write(self.ctx.manifest(name), content).expect("write manifest");
        self
    }

    /// Adjust the settings before the context is finalised.
    pub fn with_settings(mut self, f: impl FnOnce(&mut Settings)) -> Self {
        f(&mut self.ctx.settings);
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}

/// One recorded executor call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Working directory, for `run_in` calls.
    pub dir: Option<PathBuf>,
    /// Program name.
    pub program: String,
    /// Arguments.
    pub args: Vec<String>,
}

/// Executor double: records calls and answers from a queue of statuses
/// (success once the queue is empty).
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    calls: Mutex<Vec<Call>>,
    statuses: Mutex<VecDeque<ExecStatus>>,
}

impl RecordingExecutor {
    /// Answer calls with `statuses`, in order.
    pub fn with_statuses(statuses: Vec<ExecStatus>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Self::default()
        }
    }

    /// All calls recorded so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Calls to `program`, in order.
    pub fn calls_to(&self, program: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.program == program)
            .collect()
    }

    fn record(&self, dir: Option<&Path>, program: &str, args: &[&str]) -> ExecStatus {
        self.calls.lock().expect("calls lock").push(Call {
            dir: dir.map(Path::to_path_buf),
            program: program.to_string(),
            args: args.iter().map(|s| (*s).to_string()).collect(),
        });
        self.statuses
            .lock()
            .expect("statuses lock")
            .pop_front()
            .unwrap_or(ExecStatus::Success)
    }
}

impl Executor for RecordingExecutor {
    fn run(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecStatus> {
        Ok(self.record(None, program, args))
    }

    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> anyhow::Result<ExecStatus> {
        Ok(self.record(Some(dir), program, args))
    }

    fn which(&self, _: &str) -> bool {
        true
    }
}

/// Log double capturing messages as `"<level>: <text>"` and recorded steps.
#[derive(Debug, Default)]
pub struct RecordingLog {
    messages: Mutex<Vec<String>>,
    steps: Mutex<Vec<StepEntry>>,
}

impl RecordingLog {
    /// All messages so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("messages lock").clone()
    }

    /// All recorded steps so far.
    pub fn steps(&self) -> Vec<StepEntry> {
        self.steps.lock().expect("steps lock").clone()
    }

    fn push(&self, level: &str, msg: &str) {
        self.messages
            .lock()
            .expect("messages lock")
            .push(format!("{level}: {msg}"));
    }
}

impl Log for RecordingLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn dry_run(&self, msg: &str) {
        self.push("dry_run", msg);
    }
    fn record_step(&self, name: &str, status: StepStatus, message: Option<&str>) {
        self.steps.lock().expect("steps lock").push(StepEntry {
            name: name.to_string(),
            status,
            message: message.map(String::from),
        });
    }
}
