//! Build script for the bvm CLI.
//!
//! Exposes `BVM_GIT_COMMIT` so `bvm --version` can name the commit it was
//! built from. Builds outside a git checkout report `unknown`.

use std::path::PathBuf;
use std::process::Command;

fn main() {
    let commit = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=BVM_GIT_COMMIT={commit}");

    if let Some(top) = git(&["rev-parse", "--show-toplevel"]) {
        let head = PathBuf::from(top).join(".git").join("HEAD");
        println!("cargo:rerun-if-changed={}", head.display());
    }
}

/// Runs a git subcommand and returns its trimmed stdout, if any.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}
