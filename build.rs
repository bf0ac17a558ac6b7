use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");

    let hash = command_output("git", &["rev-parse", "--short", "HEAD"])
        .filter(|hash| !hash.is_empty())
        .unwrap_or_else(|| "unknown".into());
    let tree = match command_output("git", &["status", "--porcelain"]) {
        Some(changes) if changes.is_empty() => "clean",
        Some(_) => "dirty",
        None => "unknown",
    };
    let built_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let target = env::var("TARGET").unwrap_or_else(|_| "unknown-target".into());
    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown-profile".into());

    for (key, value) in [
        ("TRIP_LEDGER_BUILD_HASH", hash.as_str()),
        ("TRIP_LEDGER_BUILD_TREE", tree),
        ("TRIP_LEDGER_BUILD_TIMESTAMP", built_at.as_str()),
        ("TRIP_LEDGER_BUILD_TARGET", target.as_str()),
        ("TRIP_LEDGER_BUILD_PROFILE", profile.as_str()),
    ] {
        println!("cargo:rustc-env={key}={value}");
    }
}

/// Runs `program` and returns its trimmed stdout when it exits successfully.
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|text| text.trim().to_string())
}
