fn main() {
    println!("cargo:rerun-if-env-changed=RESTASH_BUILD_HASH");

    let hash =
        std::env::var("RESTASH_BUILD_HASH").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| {
            git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_string())
        });
    println!("cargo:rustc-env=RESTASH_BUILD_HASH={hash}");

    // Rebuild on new commits
    if let Some(git_dir) = git(&["rev-parse", "--git-dir"]) {
        println!("cargo:rerun-if-changed={git_dir}/HEAD");
        println!("cargo:rerun-if-changed={git_dir}/refs");
    }
}

fn git(args: &[&str]) -> Option<String> {
    std::process::Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
}
