use std::process::Command;

fn main() {
    // Embed the short commit id for `--version`; builds outside git get "unknown".
    let commit = Command::new("git")
        .args(["rev-parse", "--short=12", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=WARFRONT_COMMIT={commit}");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
