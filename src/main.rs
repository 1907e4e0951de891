// src/main.rs
// Initialization order: Config -> Mapping -> Bus -> Supervisor ->
// Reconciler -> HTTP. Grounded on the teacher's `src/main.rs`.

use std::env;
use std::sync::Arc;

use actix_web::web;
use tokio::sync::RwLock;

use launchdeck::api::{self, AppState};
use launchdeck::bus::ProgressBus;
use launchdeck::config::ConfigStore;
use launchdeck::installer::status::InstallStatusStore;
use launchdeck::installer::Installer;
use launchdeck::mapping::MappingStore;
use launchdeck::path_manager::PathManager;
use launchdeck::reconciler::Reconciler;
use launchdeck::supervisor::Supervisor;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let paths = PathManager::new().expect("failed to resolve workspace paths");

    let config_store = ConfigStore::new();
    let loaded = config_store
        .load()
        .await
        .expect("failed to load app configuration");
    println!("✅ loaded {} app config(s) from {}", loaded.apps.len(), loaded.effective_manifest_url);

    let hidden = env::var("MAKE_MAPPING_FILES_HIDDEN")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let mapping = MappingStore::new(paths.clone(), hidden);

    let bus = ProgressBus::new();

    let supervisor = Supervisor::new(bus.clone());
    supervisor.spawn_reaper();

    let status_store = InstallStatusStore::load(paths.install_status_file())
        .expect("failed to load install status store");
    let installer = Installer::new(bus.clone(), status_store.clone(), paths.workspace_root().to_path_buf());

    let disable_pullback = env::var("DISABLE_PULLBACK_MODELS")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    let reconciler = Arc::new(Reconciler::new(mapping.clone(), bus.clone(), disable_pullback));
    reconciler.spawn_ticker();

    let state = web::Data::new(AppState {
        apps: RwLock::new(loaded.apps),
        common: RwLock::new(loaded.common),
        supervisor,
        installer,
        reconciler,
        mapping,
        bus,
        paths: paths.clone(),
        status_store,
    });

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:7223".to_string());
    println!("🚀 launchdeck listening on {bind_addr}");

    api::start_api_server(state, &bind_addr).await
}
