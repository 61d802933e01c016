use std::path::Path;
use std::process::Command;

/// Short commit hash of the workspace, if it is a git checkout.
fn git_sha(workspace: &Path) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(workspace)
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let sha = String::from_utf8_lossy(&out.stdout).trim().to_string();
    (!sha.is_empty()).then_some(sha)
}

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let version = std::env::var("CARGO_PKG_VERSION").unwrap_or_default();
    let sha = git_sha(&Path::new(&manifest_dir).join("..")).unwrap_or_else(|| "unknown".into());

    println!("cargo:rustc-env=TALLY_VERSION={version} ({sha})");
    println!("cargo:rerun-if-changed=data/sample_tasks.json");
}
