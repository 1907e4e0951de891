// src/bus/mod.rs
// Progress Bus: broadcast channel of structured events fanned out to
// every connected WebSocket client. Best-effort, fire-and-forget per
// receiver, with per-receiver failure isolation.

use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum BusEvent {
    #[serde(rename = "install_progress")]
    InstallProgress {
        app_id: String,
        percentage: u32,
        stage: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        speed: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        eta: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        downloaded: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        processed: Option<String>,
    },

    #[serde(rename = "install_log")]
    InstallLog { app_id: String, log: String },

    #[serde(rename = "install_complete")]
    InstallComplete {
        app_id: String,
        status: String,
        message: String,
    },

    #[serde(rename = "status_update")]
    StatusUpdate { app_id: String, status: String },

    #[serde(rename = "model_download_progress")]
    ModelDownloadProgress {
        model_name: String,
        percentage: u32,
    },

    #[serde(rename = "extend_ui_helper")]
    ExtendUiHelper {
        cmd: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

/// Single logical broadcaster; every WS session subscribes its own receiver.
#[derive(Clone)]
pub struct ProgressBus {
    sender: broadcast::Sender<BusEvent>,
}

impl ProgressBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.sender.subscribe()
    }

    /// Fire-and-forget; `send` only errors when there are zero receivers,
    /// which is not a failure for a publisher with no listeners yet.
    pub fn publish(&self, event: BusEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for ProgressBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = ProgressBus::new();
        let mut rx = bus.subscribe();

        bus.publish(BusEvent::StatusUpdate {
            app_id: "ComfyUI".into(),
            status: "running".into(),
        });

        let event = rx.recv().await.unwrap();
        match event {
            BusEvent::StatusUpdate { app_id, status } => {
                assert_eq!(app_id, "ComfyUI");
                assert_eq!(status, "running");
            }
            _ => panic!("unexpected event variant"),
        }
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = ProgressBus::new();
        bus.publish(BusEvent::ExtendUiHelper {
            cmd: "refreshModelTypes".into(),
            message: None,
        });
    }
}
