// src/installer/manifest.rs
// InstalledVenvManifest, written into VENV/.venv_info.json on successful install.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AvailableVenv;
use crate::error::AppResult;
use crate::util::jsonio::write_json_atomic;

const MANIFEST_FILENAME: &str = ".venv_info.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstalledVenvManifest {
    pub installed_venv_version: String,
    pub installation_time: DateTime<Utc>,
    pub refresh_time: DateTime<Utc>,
    pub venv: AvailableVenv,
}

pub fn path_for(venv_path: &Path) -> std::path::PathBuf {
    venv_path.join(MANIFEST_FILENAME)
}

pub fn read(venv_path: &Path) -> Option<InstalledVenvManifest> {
    let raw = std::fs::read_to_string(path_for(venv_path)).ok()?;
    serde_json::from_str(&raw).ok()
}

pub fn write(venv_path: &Path, manifest: &InstalledVenvManifest) -> AppResult<()> {
    write_json_atomic(&path_for(venv_path), manifest)
}

/// On refresh, only `refresh_time` changes; the recorded installation
/// time and resolved venv metadata are left untouched.
pub fn touch_refresh(venv_path: &Path, now: DateTime<Utc>) -> AppResult<()> {
    if let Some(mut manifest) = read(venv_path) {
        manifest.refresh_time = now;
        write(venv_path, &manifest)
    } else {
        Ok(())
    }
}
