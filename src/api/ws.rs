// src/api/ws.rs
// WS /ws: bidirectional progress stream. Client heartbeats are echoed;
// BusEvent publications are pushed as they arrive.

use std::time::Duration;

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::warn;

use super::state::AppState;

const CLIENT_READ_TIMEOUT: Duration = Duration::from_secs(70);

pub async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> actix_web::Result<HttpResponse> {
    let (response, mut session, mut msg_stream) = actix_ws::handle(&req, stream)?;
    let mut events = state.bus.subscribe();

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Ok(event) => {
                            if let Ok(payload) = serde_json::to_string(&event) {
                                if session.text(payload).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    }
                }

                msg = tokio::time::timeout(CLIENT_READ_TIMEOUT, msg_stream.recv()) => {
                    match msg {
                        Ok(Some(Ok(actix_ws::Message::Text(text)))) => {
                            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
                                if value.get("type").and_then(|t| t.as_str()) == Some("heartbeat") {
                                    let _ = session.text(json!({"type": "heartbeat"}).to_string()).await;
                                }
                            }
                        }
                        Ok(Some(Ok(actix_ws::Message::Close(reason)))) => {
                            let _ = session.close(reason).await;
                            break;
                        }
                        Ok(Some(Ok(actix_ws::Message::Ping(bytes)))) => {
                            let _ = session.pong(&bytes).await;
                        }
                        Ok(Some(Ok(_))) => {}
                        Ok(Some(Err(e))) => {
                            warn!(error = %e, "websocket protocol error");
                            break;
                        }
                        Ok(None) => break,
                        // Timeout is not an error; clients heartbeat faster than this.
                        Err(_) => {}
                    }
                }
            }
        }
    });

    Ok(response)
}
