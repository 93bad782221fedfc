//! Exposes the workspace `VERSION` file as `SCAN_GUARD_VERSION`.

use std::error::Error;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR")?);
    let version_path = manifest_dir
        .ancestors()
        .nth(2)
        .ok_or("workspace root above crates/ not found")?
        .join("VERSION");

    println!("cargo:rerun-if-changed={}", version_path.display());

    let version = std::fs::read_to_string(&version_path)?.trim().to_string();
    let semver_like = !version.is_empty()
        && version
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '+'));
    if !semver_like {
        return Err(
            format!("VERSION must be a non-empty semver-like string, got {version:?}").into(),
        );
    }

    println!("cargo:rustc-env=SCAN_GUARD_VERSION={version}");
    Ok(())
}
