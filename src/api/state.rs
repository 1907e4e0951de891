// src/api/state.rs
// Shared application state handed to every route via web::Data.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::bus::ProgressBus;
use crate::config::{AppConfig, CommonSettings};
use crate::installer::status::InstallStatusStore;
use crate::installer::Installer;
use crate::mapping::MappingStore;
use crate::path_manager::PathManager;
use crate::reconciler::Reconciler;
use crate::supervisor::Supervisor;

pub struct AppState {
    pub apps: RwLock<HashMap<String, AppConfig>>,
    pub common: RwLock<CommonSettings>,
    pub supervisor: Supervisor,
    pub installer: Installer,
    pub reconciler: Arc<Reconciler>,
    pub mapping: MappingStore,
    pub bus: ProgressBus,
    pub paths: PathManager,
    pub status_store: InstallStatusStore,
}

impl AppState {
    pub async fn app_config(&self, app_id: &str) -> Option<AppConfig> {
        self.apps.read().await.get(app_id).cloned()
    }
}
