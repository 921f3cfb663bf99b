//! Command-line entry point for `pkg-install`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use pkg_install::{cli, commands, interrupt, logging};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    logging::init_subscriber(args.verbose, "install", &args.operands());
    let log = logging::Logger::new("install");
    if let Err(e) = interrupt::install_handler() {
        log.warn(&format!("{e:#}"));
    }

    match commands::install::run(&args, &cwd, &log) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
