// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=CODE_SCANNER_VERSION");

    // Packaged builds pin the version explicitly
    let version = std::env::var("CODE_SCANNER_VERSION").unwrap_or_else(|_| describe_version());

    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

/// Package version with the short commit hash appended when built from git
///
/// "0.1.0" outside a checkout, "0.1.0-abcdef1" inside one.
fn describe_version() -> String {
    let package_version = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".into());

    match get_commit_hash() {
        Some(hash) => format!("{}-{}", package_version, hash),
        None => package_version,
    }
}

fn get_commit_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}
