//! Ctrl-C handling.
//!
//! The handler only raises a flag: the foreground child receives the same
//! signal from the terminal and exits on its own, after which the executor
//! consumes the flag and reports that single call as cancelled. A flag
//! raised while no command runs is reported as a warning before the next
//! spawn.
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context as _, Result};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Serializes tests that touch the interrupt flag, directly or by spawning
/// processes through the system executor.
#[cfg(test)]
pub(crate) static TEST_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Install the process-wide interrupt handler.
///
/// # Errors
///
/// Returns an error if a handler is already installed.
pub fn install_handler() -> Result<()> {
    ctrlc::set_handler(mark).context("installing Ctrl-C handler")
}

/// Record that an interrupt arrived.
pub fn mark() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Consume the interrupt flag, returning whether it was set.
pub fn take() -> bool {
    INTERRUPTED.swap(false, Ordering::SeqCst)
}
