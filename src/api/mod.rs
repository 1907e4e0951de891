// src/api/mod.rs
// Single-port HTTP + WS frontend. Grounded on the teacher's
// `src/api/mod.rs::start_api_server`.

pub mod middleware;
pub mod routes;
pub mod state;
pub mod ws;

use std::io;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};

pub use state::AppState;

/// Binds and runs the HTTP server; does not return until shutdown.
pub async fn start_api_server(state: web::Data<AppState>, bind_addr: &str) -> io::Result<()> {
    let bind_addr = bind_addr.to_string();

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(middleware::RequestId)
            .app_data(state.clone())
            .route("/", web::get().to(routes::root_handler))
            .route("/status", web::get().to(routes::status_handler))
            .route("/start/{app_id}", web::get().to(routes::start_handler))
            .route("/stop/{app_id}", web::get().to(routes::stop_handler))
            .route("/kill_all", web::post().to(routes::kill_all_handler))
            .route("/force_kill/{app_id}", web::post().to(routes::force_kill_handler))
            .route("/logs/{app_id}", web::get().to(routes::logs_handler))
            .route("/install/{app_id}", web::post().to(routes::install_handler))
            .route("/install_status/{app_id}", web::get().to(routes::install_status_handler))
            .route("/fix_custom_nodes/{app_id}", web::post().to(routes::fix_custom_nodes_handler))
            .route("/recreate_symlinks", web::post().to(routes::recreate_symlinks_handler))
            .route("/create_shared_folders", web::post().to(routes::create_shared_folders_handler))
            .route("/get_model_types", web::get().to(routes::get_model_types_handler))
            .route("/get_model_folders", web::get().to(routes::get_model_folders_handler))
            .route("/get_bkohya_launch_url", web::get().to(routes::get_launch_url_handler))
            .route("/download_model", web::post().to(routes::download_model_stub_handler))
            .route("/get_{platform}_token", web::get().to(routes::token_stub_handler))
            .route("/save_{platform}_token", web::post().to(routes::token_stub_handler))
            .route("/add_app_config", web::post().to(routes::add_app_config_handler))
            .route("/remove_app_config/{app_id}", web::post().to(routes::remove_app_config_handler))
            .route("/ws", web::get().to(ws::ws_handler))
    })
    .bind(&bind_addr)?
    .run()
    .await
}
