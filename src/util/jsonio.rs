// src/util/jsonio.rs
// JSON read/write helpers shared by the config and mapping stores.
// Writes use write-then-rename for atomicity, per spec section 5.

use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

use crate::error::AppResult;

/// Reads `path` as JSON if present; otherwise writes `default` (pretty
/// printed) to `path` and returns it unchanged. Returns whether the file
/// was loaded from disk (`true`) or just seeded (`false`).
pub fn read_json_or_default<T>(path: &Path, default: T) -> AppResult<(bool, T)>
where
    T: Serialize + DeserializeOwned,
{
    if path.exists() {
        let raw = std::fs::read_to_string(path)?;
        let value = serde_json::from_str(&raw)?;
        Ok((true, value))
    } else {
        write_json_atomic(path, &default)?;
        Ok((false, default))
    }
}

/// Serializes `value` and writes it via a temp file + rename so readers
/// never observe a partially written mapping file.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(value)?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, raw)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        name: String,
    }

    #[test]
    fn seeds_default_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.json");
        let default = Sample { name: "default".into() };
        let (loaded, value) = read_json_or_default(&path, default).unwrap();
        assert!(!loaded);
        assert_eq!(value.name, "default");
        assert!(path.exists());
    }

    #[test]
    fn loads_existing_file_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.json");
        write_json_atomic(&path, &Sample { name: "existing".into() }).unwrap();

        let (loaded, value) = read_json_or_default(&path, Sample { name: "default".into() }).unwrap();
        assert!(loaded);
        assert_eq!(value.name, "existing");
    }
}
