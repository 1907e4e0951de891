// src/reconciler/mod.rs
// Shared-Model Reconciler: the central algorithm. Grounded on
// `update_model_symlinks()` and its three helpers in
// `original_source/.../shared_models.py`.

mod cell;
mod folders;

pub use folders::ensure_shared_folders;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::bus::{BusEvent, ProgressBus};
use crate::error::{AppError, AppResult};
use crate::mapping::MappingStore;

const TICK_INTERVAL: Duration = Duration::from_secs(300);
const CACHE_DIR_PREFIX: &str = ".cache";

#[derive(Debug, Default, Clone, Serialize)]
pub struct ReconcileCounters {
    pub files_created: u64,
    pub folders_created: u64,
    pub broken_removed: u64,
    pub pulled: u64,
}

pub struct Reconciler {
    mapping: MappingStore,
    bus: ProgressBus,
    running: Arc<Mutex<()>>,
    disable_pullback: bool,
}

impl Reconciler {
    pub fn new(mapping: MappingStore, bus: ProgressBus, disable_pullback: bool) -> Self {
        Self {
            mapping,
            bus,
            running: Arc::new(Mutex::new(())),
            disable_pullback,
        }
    }

    pub fn spawn_ticker(self: &Arc<Self>) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK_INTERVAL);
            loop {
                ticker.tick().await;
                // The tick-owner skips its turn if a manual run is already in progress.
                if let Ok(_guard) = this.running.try_lock() {
                    drop(_guard);
                    if let Err(e) = this.reconcile().await {
                        error!(error = %e, "periodic reconcile tick failed");
                    }
                } else {
                    info!("skipping reconcile tick: a run is already in progress");
                }
            }
        });
    }

    /// The central algorithm. Single-writer: concurrent calls serialize
    /// on `running`.
    pub async fn reconcile(&self) -> AppResult<ReconcileCounters> {
        let _guard = self.running.lock().await;

        let shared_root = self.mapping.shared_models_dir();
        if !shared_root.exists() {
            return Err(AppError::PreconditionFailed(format!(
                "shared root '{}' is missing; run create_shared_folders first",
                shared_root.display()
            )));
        }

        let set = self.mapping.load()?;
        let mut counters = ReconcileCounters::default();

        for (model_type, per_app) in &set.app_map {
            let is_folder_rule = model_type.ends_with("/*");
            let source_type = model_type.trim_end_matches("/*");
            let shared_type_dir = shared_root.join(source_type);

            for (app_name, rel_path) in per_app {
                let Some(install_dir) = set.install_dirs.get(app_name) else {
                    warn!(app_name, model_type, "app not found in install dirs, skipping cell");
                    continue;
                };
                let app_install_dir = Path::new(install_dir);
                if !app_install_dir.exists() {
                    continue;
                }

                if is_folder_rule {
                    let dest = app_install_dir.join(rel_path.trim_end_matches("/*").trim_start_matches('/'));
                    match cell::reconcile_folder_rule(&shared_type_dir, &dest) {
                        Ok(created) => counters.folders_created += created,
                        Err(e) if e.is_recoverable_in_reconciler() => {
                            warn!(app_name, model_type, error = %e, "folder cell failed, continuing");
                        }
                        Err(e) => return Err(e),
                    }
                } else {
                    let dest_dir = app_install_dir.join(rel_path.trim_start_matches('/'));
                    match cell::reconcile_plain_rule(&shared_type_dir, &dest_dir, source_type, self.disable_pullback) {
                        Ok(cell_counters) => {
                            counters.files_created += cell_counters.files_created;
                            counters.broken_removed += cell_counters.broken_removed;
                            counters.pulled += cell_counters.pulled;
                        }
                        Err(e) if e.is_recoverable_in_reconciler() => {
                            warn!(app_name, model_type, error = %e, "plain cell failed, continuing");
                        }
                        Err(e) => return Err(e),
                    }
                }
            }

            cleanup_cache_dirs(&shared_type_dir);
        }

        self.bus.publish(BusEvent::StatusUpdate {
            app_id: "reconciler".to_string(),
            status: "tick_complete".to_string(),
        });

        Ok(counters)
    }
}

fn cleanup_cache_dirs(shared_type_dir: &Path) {
    let Ok(entries) = std::fs::read_dir(shared_type_dir) else {
        return;
    };
    for entry in entries.flatten() {
        if entry.file_name().to_string_lossy().starts_with(CACHE_DIR_PREFIX) {
            if let Ok(file_type) = entry.file_type() {
                if file_type.is_dir() {
                    let _ = std::fs::remove_dir_all(entry.path());
                }
            }
        }
    }
}
