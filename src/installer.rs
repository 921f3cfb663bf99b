//! Package manager invocation.
//!
//! After the walk, each non-empty package list is handed once to its
//! installer: the AUR helper first, then the system package manager.
use crate::config::Settings;
use crate::error::ConfigError;
use crate::exec::{self, Executor};
use crate::logging::{Log, StepStatus};
use crate::manifest::PackageSet;

/// Which package list an installer consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    /// System package manager (`install_command`).
    Primary,
    /// AUR helper (`aur_command`).
    Aur,
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "packages"),
            Self::Aur => write!(f, "AUR packages"),
        }
    }
}

/// One configured installer command line.
#[derive(Debug)]
pub struct Installer<'a> {
    /// Package list this installer consumes.
    pub manager: PackageManager,
    program: String,
    base_args: Vec<String>,
    executor: &'a dyn Executor,
}

impl<'a> Installer<'a> {
    /// Build an installer from pre-split command tokens.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyCommand`] if `argv` is empty.
    pub fn new(
        manager: PackageManager,
        argv: Vec<String>,
        executor: &'a dyn Executor,
    ) -> Result<Self, ConfigError> {
        let mut argv = argv.into_iter();
        let program = argv.next().ok_or_else(|| ConfigError::EmptyCommand {
            key: setting_key(manager),
            value: String::new(),
        })?;
        Ok(Self {
            manager,
            program,
            base_args: argv.collect(),
            executor,
        })
    }

    /// Build the installer for `manager` from the configured command line.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured command is empty or malformed.
    pub fn from_settings(
        manager: PackageManager,
        settings: &Settings,
        executor: &'a dyn Executor,
    ) -> Result<Self, ConfigError> {
        let argv = match manager {
            PackageManager::Primary => settings.install_argv()?,
            PackageManager::Aur => settings.aur_argv()?,
        };
        Self::new(manager, argv, executor)
    }

    /// Install `packages` with a single invocation.
    ///
    /// An empty list is a no-op. A missing installer program is recorded as
    /// a failed step without spawning anything.
    pub fn install(&self, packages: &[String], log: &dyn Log) -> StepStatus {
        if packages.is_empty() {
            log.debug(&format!("no {} to install", self.manager));
            return StepStatus::Skipped;
        }
        let step = format!("install {}", self.manager);

        if !self.executor.which(&self.program) {
            let reason = format!("{} not found on PATH", self.program);
            log.error(&format!("{step}: {reason}"));
            log.record_step(&step, StepStatus::Failed, Some(&reason));
            return StepStatus::Failed;
        }

        let args: Vec<&str> = self
            .base_args
            .iter()
            .chain(packages)
            .map(String::as_str)
            .collect();
        log.info(&format!(
            "installing {} {}: {}",
            packages.len(),
            self.manager,
            packages.join(" ")
        ));
        log.debug(&exec::display_command(&self.program, &args));
        let outcome = self.executor.run(&self.program, &args);
        exec::record_outcome(log, self.executor, &step, outcome)
    }
}

const fn setting_key(manager: PackageManager) -> &'static str {
    match manager {
        PackageManager::Primary => "install_command",
        PackageManager::Aur => "aur_command",
    }
}

/// The AUR and primary installers for one run.
#[derive(Debug)]
pub struct Installers<'a> {
    aur: Installer<'a>,
    primary: Installer<'a>,
}

impl<'a> Installers<'a> {
    /// Build both installers from the configured command lines.
    ///
    /// # Errors
    ///
    /// Returns an error if either command line is empty or malformed.
    pub fn from_settings(
        settings: &Settings,
        executor: &'a dyn Executor,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            aur: Installer::from_settings(PackageManager::Aur, settings, executor)?,
            primary: Installer::from_settings(PackageManager::Primary, settings, executor)?,
        })
    }

    /// Hand the accumulated packages to both installers, AUR first.
    ///
    /// Installer failures are logged and recorded, never returned.
    pub fn install(&self, packages: &PackageSet, log: &dyn Log) {
        self.aur.install(&packages.aur, log);
        self.primary.install(&packages.primary, log);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::exec::ExecStatus;
    use crate::exec::test_helpers::RecordingExecutor;
    use crate::logging::test_helpers::RecordingLog;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn appends_packages_to_configured_command() {
        let exec = RecordingExecutor::new();
        let log = RecordingLog::default();
        let installer =
            Installer::from_settings(PackageManager::Primary, &Settings::default(), &exec).unwrap();
        let status = installer.install(&names(&["git", "vim"]), &log);
        assert_eq!(status, StepStatus::Ok);

        let calls = exec.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "sudo");
        assert_eq!(calls[0].args, ["pacman", "-Sy", "git", "vim"]);
        assert_eq!(log.steps()[0].name, "install packages");
    }

    #[test]
    fn quoted_arguments_survive_splitting() {
        let exec = RecordingExecutor::new();
        let settings = Settings {
            aur_command: "paru -S --mflags '--skippgpcheck --nocheck'".to_string(),
            ..Settings::default()
        };
        let installer = Installer::from_settings(PackageManager::Aur, &settings, &exec).unwrap();
        installer.install(&names(&["yay-bin"]), &RecordingLog::default());
        assert_eq!(
            exec.calls()[0].args,
            ["-S", "--mflags", "--skippgpcheck --nocheck", "yay-bin"]
        );
    }

    #[test]
    fn empty_list_runs_nothing() {
        let exec = RecordingExecutor::new();
        let log = RecordingLog::default();
        let installer =
            Installer::from_settings(PackageManager::Aur, &Settings::default(), &exec).unwrap();
        assert_eq!(installer.install(&[], &log), StepStatus::Skipped);
        assert!(exec.calls().is_empty());
        assert!(log.steps().is_empty());
    }

    #[test]
    fn missing_program_fails_without_spawning() {
        let exec = RecordingExecutor::new().with_which(false);
        let log = RecordingLog::default();
        let installer =
            Installer::from_settings(PackageManager::Aur, &Settings::default(), &exec).unwrap();
        assert_eq!(installer.install(&names(&["foo"]), &log), StepStatus::Failed);
        assert!(exec.calls().is_empty());
        assert_eq!(
            log.steps()[0].message.as_deref(),
            Some("yay not found on PATH")
        );
    }

    #[test]
    fn failure_and_cancellation_are_recorded_not_returned() {
        let exec = RecordingExecutor::with_statuses(vec![
            ExecStatus::Failed(Some(1)),
            ExecStatus::Cancelled,
        ]);
        let log = RecordingLog::default();
        let packages = PackageSet {
            primary: names(&["git"]),
            aur: names(&["yay-bin"]),
        };
        Installers::from_settings(&Settings::default(), &exec)
            .unwrap()
            .install(&packages, &log);
        let steps = log.steps();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].status, StepStatus::Failed);
        assert_eq!(steps[1].status, StepStatus::Cancelled);
    }

    #[test]
    fn aur_runs_before_primary() {
        let exec = RecordingExecutor::new();
        let packages = PackageSet {
            primary: names(&["git", "vim"]),
            aur: names(&["yay-helper-pkg"]),
        };
        Installers::from_settings(&Settings::default(), &exec)
            .unwrap()
            .install(&packages, &RecordingLog::default());
        let programs: Vec<String> = exec.calls().into_iter().map(|c| c.program).collect();
        assert_eq!(programs, ["yay", "sudo"]);
    }

    #[test]
    fn empty_command_is_a_config_error() {
        let exec = RecordingExecutor::new();
        let settings = Settings {
            install_command: "   ".to_string(),
            ..Settings::default()
        };
        let err = Installers::from_settings(&settings, &exec).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EmptyCommand {
                key: "install_command",
                ..
            }
        ));
    }

    #[test]
    fn new_rejects_empty_argv() {
        let exec = RecordingExecutor::new();
        assert!(Installer::new(PackageManager::Aur, vec![], &exec).is_err());
    }

    #[test]
    fn manager_display() {
        assert_eq!(PackageManager::Primary.to_string(), "packages");
        assert_eq!(PackageManager::Aur.to_string(), "AUR packages");
    }
}
