// src/path_manager.rs
// Centralized workspace paths, grounded on the teacher's PathManager.

use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("failed to create directory: {0}")]
    CreateDirFailed(String),
}

/// Fixed filesystem layout under the workspace root, matching spec section 6.
#[derive(Debug, Clone)]
pub struct PathManager {
    workspace_root: PathBuf,
    shared_models_dir: PathBuf,
    install_status_file: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self, PathError> {
        let workspace_root = env::var("WORKSPACE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/workspace"));

        let shared_models_dir = workspace_root.join("shared_models");
        let install_status_file = env::var("INSTALL_STATUS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp/install_status.json"));

        Ok(Self {
            workspace_root,
            shared_models_dir,
            install_status_file,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn shared_models_dir(&self) -> &Path {
        &self.shared_models_dir
    }

    pub fn install_status_file(&self) -> &Path {
        &self.install_status_file
    }

    /// Mapping-file path, hidden (leading dot) when `hidden` is set.
    pub fn mapping_file(&self, name: &str, hidden: bool) -> PathBuf {
        let prefix = if hidden { "." } else { "" };
        self.shared_models_dir.join(format!("{prefix}{name}.json"))
    }

    pub fn ensure_dir(path: &Path) -> Result<(), PathError> {
        if !path.exists() {
            std::fs::create_dir_all(path)
                .map_err(|e| PathError::CreateDirFailed(format!("{}: {}", path.display(), e)))?;
        }
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        Self::new().expect("failed to initialize PathManager")
    }
}
