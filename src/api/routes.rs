// src/api/routes.rs
// HTTP surface (spec section 6). Thin dispatchers onto Supervisor,
// Installer, Reconciler and the Config/Mapping stores.

use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::installer::status::InstallState;
use crate::supervisor::{ProcessStatus, StopOutcome};
use crate::util::sizefmt::folder_size_kb;

use super::state::AppState;

pub async fn root_handler() -> impl Responder {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body("<html><body><h1>launchdeck</h1></body></html>")
}

pub async fn status_handler(state: web::Data<AppState>) -> impl Responder {
    let apps = state.apps.read().await;
    let mut out = serde_json::Map::new();
    for app_id in apps.keys() {
        let status = state.supervisor.status(app_id).await;
        let label = match status {
            Some(ProcessStatus::Running) => "running",
            Some(ProcessStatus::Stopped) => "stopped",
            None => "not_started",
        };
        out.insert(app_id.clone(), json!(label));
    }
    HttpResponse::Ok().json(out)
}

pub async fn start_handler(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let app_id = path.into_inner();
    let Some(config) = state.app_config(&app_id).await else {
        return HttpResponse::NotFound().json(json!({"status": "error", "message": format!("unknown app '{app_id}'")}));
    };

    match state.supervisor.start(&config).await {
        Ok(outcome) => HttpResponse::Ok().json(json!({"status": outcome})),
        Err(e) => HttpResponse::Ok().json(json!({"status": "error", "message": e.to_string()})),
    }
}

pub async fn stop_handler(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let app_id = path.into_inner();
    match state.supervisor.stop(&app_id).await {
        Ok(StopOutcome::Stopped) => HttpResponse::Ok().json(json!({"status": "stopped"})),
        Ok(StopOutcome::AlreadyStopped) => HttpResponse::Ok().json(json!({"status": "already_stopped"})),
        Ok(StopOutcome::NotRunning) => HttpResponse::Ok().json(json!({"status": "not_running"})),
        Err(e) => HttpResponse::InternalServerError().json(json!({"status": "error", "message": e.to_string()})),
    }
}

pub async fn kill_all_handler(state: web::Data<AppState>) -> impl Responder {
    state.supervisor.kill_all().await;
    HttpResponse::Ok().json(json!({"status": "ok"}))
}

pub async fn force_kill_handler(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let app_id = path.into_inner();
    let Some(config) = state.app_config(&app_id).await else {
        return HttpResponse::NotFound().json(json!({"status": "error", "message": format!("unknown app '{app_id}'")}));
    };

    match state.supervisor.force_kill_by_port(&app_id, config.port).await {
        Ok(true) => HttpResponse::Ok().json(json!({"status": "ok"})),
        Ok(false) => HttpResponse::Ok().json(json!({"status": "error", "message": "no listening process found"})),
        Err(e) => HttpResponse::InternalServerError().json(json!({"status": "error", "message": e.to_string()})),
    }
}

pub async fn logs_handler(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let app_id = path.into_inner();
    let lines = state.supervisor.last_logs(&app_id, 100).await;
    HttpResponse::Ok().json(json!({"logs": lines}))
}

#[derive(Deserialize)]
pub struct InstallRequest {
    pub venv_version: Option<String>,
}

pub async fn install_handler(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<InstallRequest>,
) -> impl Responder {
    let app_id = path.into_inner();
    let Some(config) = state.app_config(&app_id).await else {
        return HttpResponse::NotFound().json(json!({"status": "error", "message": format!("unknown app '{app_id}'")}));
    };
    let common = state.common.read().await.clone();

    match state.installer.install(&config, &common, body.venv_version.as_deref()).await {
        Ok(message) => HttpResponse::Ok().json(json!({"status": "success", "message": message})),
        Err(e) => HttpResponse::Ok().json(json!({"status": "error", "message": e.to_string()})),
    }
}

pub async fn fix_custom_nodes_handler(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let app_id = path.into_inner();
    let Some(config) = state.app_config(&app_id).await else {
        return HttpResponse::NotFound().json(json!({"status": "error", "message": format!("unknown app '{app_id}'")}));
    };
    if !config.kind.has_custom_nodes {
        return HttpResponse::BadRequest().json(json!({"status": "error", "message": "app has no custom nodes"}));
    }

    match crate::installer::bash_templates::run_template(
        &config.bash_cmds,
        "fix-custom_nodes",
        &config.venv_path,
        &config.app_path,
        None,
    ) {
        Ok(output) => HttpResponse::Ok().json(json!({"status": "success", "message": output})),
        Err(e) => HttpResponse::Ok().json(json!({"status": "error", "message": e.to_string()})),
    }
}

pub async fn recreate_symlinks_handler(state: web::Data<AppState>) -> impl Responder {
    match state.reconciler.reconcile().await {
        Ok(counters) => HttpResponse::Ok().json(json!({"status": "success", "counters": counters})),
        Err(e) => HttpResponse::Ok().json(json!({"status": "error", "message": e.to_string()})),
    }
}

pub async fn create_shared_folders_handler(state: web::Data<AppState>) -> impl Responder {
    let set = match state.mapping.load() {
        Ok(set) => set,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"status": "error", "message": e.to_string()})),
    };

    match crate::reconciler::ensure_shared_folders(state.mapping.shared_models_dir(), &set.folders) {
        Ok(()) => HttpResponse::Ok().json(json!({"status": "success"})),
        Err(e) => HttpResponse::InternalServerError().json(json!({"status": "error", "message": e.to_string()})),
    }
}

pub async fn get_model_types_handler(state: web::Data<AppState>) -> impl Responder {
    if !state.mapping.shared_models_dir().exists() {
        return HttpResponse::Ok().json(serde_json::Map::new());
    }
    match state.mapping.load_folders() {
        Ok((_, folders)) => HttpResponse::Ok().json(folders),
        Err(e) => HttpResponse::InternalServerError().json(json!({"status": "error", "message": e.to_string()})),
    }
}

pub async fn get_model_folders_handler(state: web::Data<AppState>) -> impl Responder {
    let (_, folders) = match state.mapping.load_folders() {
        Ok(v) => v,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"status": "error", "message": e.to_string()})),
    };

    let shared_root = state.mapping.shared_models_dir();
    let mut out = serde_json::Map::new();
    for model_type in folders.keys() {
        let dir = shared_root.join(model_type.trim_end_matches("/*"));
        let file_count = std::fs::read_dir(&dir).map(|it| it.count()).unwrap_or(0);
        out.insert(
            model_type.clone(),
            json!({"size_kb": folder_size_kb(&dir), "file_count": file_count}),
        );
    }
    HttpResponse::Ok().json(out)
}

pub async fn token_stub_handler() -> impl Responder {
    HttpResponse::NotImplemented().json(json!({"status": "error", "message": "token management is out of scope"}))
}

pub async fn download_model_stub_handler() -> impl Responder {
    HttpResponse::NotImplemented().json(json!({"status": "error", "message": "model downloader is out of scope"}))
}

pub async fn add_app_config_handler(state: web::Data<AppState>, body: web::Json<crate::config::AppConfig>) -> impl Responder {
    let config = body.into_inner();
    let id = config.id.clone();
    state.apps.write().await.insert(id.clone(), config);
    HttpResponse::Ok().json(json!({"status": "success", "id": id}))
}

pub async fn remove_app_config_handler(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let app_id = path.into_inner();
    let removed = state.apps.write().await.remove(&app_id).is_some();
    if removed {
        HttpResponse::Ok().json(json!({"status": "success"}))
    } else {
        HttpResponse::NotFound().json(json!({"status": "error", "message": format!("unknown app '{app_id}'")}))
    }
}

/// Historically `/get_bkohya_launch_url`; generalized over every app
/// whose AppKind enables launch-url discovery.
pub async fn get_launch_url_handler(state: web::Data<AppState>) -> impl Responder {
    let apps = state.apps.read().await;
    let Some(config) = apps.values().find(|c| c.kind.discovers_launch_url) else {
        return HttpResponse::NotFound().json(json!({"status": "error", "message": "no app configured for launch-url discovery"}));
    };

    match state.supervisor.launch_url(&config.id).await {
        Some(url) if url.contains("gradio.live") => HttpResponse::Ok().json(json!({"mode": "gradio", "url": url})),
        Some(url) => HttpResponse::Ok().json(json!({"mode": "local", "url": url})),
        None => HttpResponse::Ok().json(json!({"mode": "unknown", "url": serde_json::Value::Null})),
    }
}

pub async fn install_status_handler(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let app_id = path.into_inner();
    let status = state.status_store.get(&app_id).await;
    let label = match status.status {
        InstallState::NotStarted => "not_started",
        InstallState::InProgress => "in_progress",
        InstallState::Completed => "completed",
        InstallState::Failed => "failed",
    };
    HttpResponse::Ok().json(json!({"status": label, "progress": status.progress, "stage": status.stage}))
}
