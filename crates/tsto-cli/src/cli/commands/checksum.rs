//! Checksum command: compute SHA-256 of a file.

use anyhow::{bail, Result};
use std::path::Path;
use tsto_core::checksum;

/// Print SHA-256 of the given file; with `expect`, fail on mismatch.
pub fn run_checksum(path: &Path, expect: Option<&str>) -> Result<()> {
    let digest = checksum::sha256_path(path)?;
    println!("{}  {}", digest, path.display());
    if let Some(expected) = expect {
        if !checksum::digest_matches(&digest, expected) {
            bail!("checksum mismatch for {}: expected {}", path.display(), expected.trim());
        }
    }
    Ok(())
}
