// src/installer/verify.rs
// Verify stage: stream-hash the archive and compare against the manifest.

use std::path::Path;

use crate::error::{AppError, AppResult};
use crate::util::hashing::sha256_file;

/// Deletes the archive and fails, naming both hashes, on mismatch.
pub fn verify(archive_path: &Path, expected_sha256: &str) -> AppResult<()> {
    if expected_sha256.is_empty() {
        return Ok(());
    }

    let computed = sha256_file(archive_path)?;
    if computed != expected_sha256.to_lowercase() {
        let _ = std::fs::remove_file(archive_path);
        return Err(AppError::IntegrityError(format!(
            "hash mismatch: computed {computed}, expected {expected_sha256}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_on_matching_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.tar.gz");
        std::fs::write(&path, b"hello world").unwrap();
        let hash = sha256_file(&path).unwrap();
        assert!(verify(&path, &hash).is_ok());
        assert!(path.exists());
    }

    #[test]
    fn deletes_archive_and_fails_on_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.tar.gz");
        std::fs::write(&path, b"hello world").unwrap();

        let err = verify(&path, "b".repeat(64).as_str()).unwrap_err();
        assert!(matches!(err, AppError::IntegrityError(_)));
        assert!(!path.exists());
    }
}
