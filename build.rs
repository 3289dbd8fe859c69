// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");

    // Packagers can pin the version string without a git checkout
    let version = if let Ok(v) = std::env::var("CAMERA_FILTER_VERSION") {
        v
    } else {
        git_version().unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string())
    };

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// `git describe` output without the leading `v`, or the package version
/// suffixed with the short hash when HEAD is not tagged.
fn git_version() -> Option<String> {
    let described = run_git(&["describe", "--tags", "--exact-match", "--match", "v*"]);
    if let Some(tag) = described {
        return Some(tag.strip_prefix('v').unwrap_or(&tag).to_string());
    }

    let hash = run_git(&["rev-parse", "--short", "HEAD"])?;
    Some(format!("{}-{}", env!("CARGO_PKG_VERSION"), hash))
}

fn run_git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;

    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}
