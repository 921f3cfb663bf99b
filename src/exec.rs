//! Subprocess execution.
//!
//! Every side effect of a run (command files, clones, post-clone commands,
//! installers) goes through the [`Executor`] trait so the manifest walker can
//! be driven by a recording double in tests or by [`DryRunExecutor`] from the
//! command line.
use anyhow::{Context as _, Result};
use std::fmt;
use std::path::Path;
use std::process::Command;

use crate::interrupt;
use crate::logging::{Log, StepStatus};

/// Outcome of a finished subprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    /// The process exited with status zero.
    Success,
    /// The process exited non-zero, or was killed (`None`).
    Failed(Option<i32>),
    /// The user interrupted the process.
    Cancelled,
}

impl fmt::Display for ExecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed(Some(code)) => write!(f, "exit {code}"),
            Self::Failed(None) => write!(f, "terminated by signal"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Runs external programs with inherited stdio, blocking until they exit.
pub trait Executor: fmt::Debug {
    /// Run `program` with `args` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process could not be spawned. A non-zero
    /// exit is reported through [`ExecStatus`].
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecStatus>;

    /// Run `program` with `args` in `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process could not be spawned.
    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecStatus>;

    /// Check if a program is available on `PATH`.
    fn which(&self, program: &str) -> bool;

    /// Whether commands are only printed, not run.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Log the outcome of one step and record it for the summary.
///
/// Failures and cancellations are reported, never returned: the caller
/// carries on with the next step either way.
pub fn record_outcome(
    log: &dyn Log,
    executor: &dyn Executor,
    step: &str,
    outcome: Result<ExecStatus>,
) -> StepStatus {
    let status = match outcome {
        Ok(ExecStatus::Success) if executor.is_dry_run() => StepStatus::DryRun,
        Ok(ExecStatus::Success) => StepStatus::Ok,
        Ok(ExecStatus::Cancelled) => {
            log.warn(&format!("{step}: cancelled"));
            StepStatus::Cancelled
        }
        Ok(status @ ExecStatus::Failed(_)) => {
            log.error(&format!("{step}: {status}"));
            log.record_step(step, StepStatus::Failed, Some(&status.to_string()));
            return StepStatus::Failed;
        }
        Err(e) => {
            log.error(&format!("{step}: {e:#}"));
            log.record_step(step, StepStatus::Failed, Some(&format!("{e:#}")));
            return StepStatus::Failed;
        }
    };
    log.record_step(step, status, None);
    status
}

/// Render a command line for log output.
#[must_use]
pub fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Spawn `cmd`, wait for it and translate the exit into an [`ExecStatus`].
fn wait(mut cmd: Command, label: &str) -> Result<ExecStatus> {
    // An interrupt raised between two commands must not cancel this one.
    if interrupt::take() {
        tracing::warn!("interrupt received outside a running command; ignored");
    }
    let status = cmd
        .status()
        .with_context(|| format!("failed to execute: {label}"))?;
    if interrupt::take() {
        return Ok(ExecStatus::Cancelled);
    }
    if status.success() {
        Ok(ExecStatus::Success)
    } else {
        Ok(ExecStatus::Failed(status.code()))
    }
}

/// Executor backed by real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecStatus> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        wait(cmd, program)
    }

    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecStatus> {
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(dir);
        wait(cmd, &format!("{program} in {}", dir.display()))
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Executor that logs every command instead of running it.
pub struct DryRunExecutor<'a> {
    log: &'a dyn Log,
}

impl<'a> DryRunExecutor<'a> {
    /// Create a dry-run executor reporting through `log`.
    #[must_use]
    pub const fn new(log: &'a dyn Log) -> Self {
        Self { log }
    }
}

impl fmt::Debug for DryRunExecutor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DryRunExecutor")
            .field("log", &"<dyn Log>")
            .finish()
    }
}

impl Executor for DryRunExecutor<'_> {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecStatus> {
        self.log.dry_run(&display_command(program, args));
        Ok(ExecStatus::Success)
    }

    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecStatus> {
        self.log.dry_run(&format!(
            "(in {}) {}",
            dir.display(),
            display_command(program, args)
        ));
        Ok(ExecStatus::Success)
    }

    fn which(&self, _: &str) -> bool {
        true
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
