use std::fs::File;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// SHA-256 digest of a file, lowercase hex.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| {
        Error::internal_io(
            format!("Failed to open {}: {}", path.display(), e),
            Some("hash file".to_string()),
        )
    })?;

    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher).map_err(|e| {
        Error::internal_io(
            format!("Failed to read {}: {}", path.display(), e),
            Some("hash file".to_string()),
        )
    })?;

    let digest = hasher.finalize();
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}
