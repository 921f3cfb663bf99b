//! Embeds the build's version string as `PKG_INSTALL_VERSION`.
#![allow(clippy::print_stdout)]
use std::process::Command;

const VERSION_VAR: &str = "PKG_INSTALL_VERSION";

/// Version from the environment (release builds), else `git describe`.
fn detect_version() -> Option<String> {
    if let Ok(version) = std::env::var(VERSION_VAR) {
        return Some(version);
    }
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (output.status.success() && !version.is_empty()).then_some(version)
}

fn main() {
    if let Some(version) = detect_version() {
        println!("cargo:rustc-env={VERSION_VAR}={version}");
    }
    for watched in [".git/HEAD", ".git/refs/"] {
        println!("cargo:rerun-if-changed={watched}");
    }
    println!("cargo:rerun-if-env-changed={VERSION_VAR}");
}
