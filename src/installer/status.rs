// src/installer/status.rs
// InstallStatus: persisted on disk, keyed by app id, durable across restarts.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::AppResult;
use crate::util::jsonio::{read_json_or_default, write_json_atomic};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallState {
    NotStarted,
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallStatus {
    pub status: InstallState,
    pub progress: u32,
    pub stage: String,
}

impl Default for InstallStatus {
    fn default() -> Self {
        Self {
            status: InstallState::NotStarted,
            progress: 0,
            stage: String::new(),
        }
    }
}

/// File-backed map of app id -> InstallStatus, rewritten atomically on
/// every update.
#[derive(Clone)]
pub struct InstallStatusStore {
    path: std::path::PathBuf,
    inner: Arc<Mutex<HashMap<String, InstallStatus>>>,
}

impl InstallStatusStore {
    pub fn load(path: &std::path::Path) -> AppResult<Self> {
        let (_, statuses) = read_json_or_default(path, HashMap::<String, InstallStatus>::new())?;
        Ok(Self {
            path: path.to_path_buf(),
            inner: Arc::new(Mutex::new(statuses)),
        })
    }

    pub async fn get(&self, app_id: &str) -> InstallStatus {
        self.inner
            .lock()
            .await
            .get(app_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn set(&self, app_id: &str, status: InstallStatus) -> AppResult<()> {
        let mut guard = self.inner.lock().await;
        guard.insert(app_id.to_string(), status);
        write_json_atomic(&self.path, &*guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn persists_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("install_status.json");

        let store = InstallStatusStore::load(&path).unwrap();
        store
            .set(
                "ComfyUI",
                InstallStatus {
                    status: InstallState::InProgress,
                    progress: 42,
                    stage: "Downloading".to_string(),
                },
            )
            .await
            .unwrap();

        let reloaded = InstallStatusStore::load(&path).unwrap();
        let status = reloaded.get("ComfyUI").await;
        assert_eq!(status.progress, 42);
        assert_eq!(status.stage, "Downloading");
    }

    #[tokio::test]
    async fn unknown_app_defaults_to_not_started() {
        let dir = tempfile::tempdir().unwrap();
        let store = InstallStatusStore::load(&dir.path().join("install_status.json")).unwrap();
        let status = store.get("missing").await;
        assert_eq!(status.status, InstallState::NotStarted);
    }
}
