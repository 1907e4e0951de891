// src/supervisor/mod.rs
// Process Supervisor: launches child processes in their own process
// group, captures stdout into a bounded ring buffer, tracks liveness,
// and offers graceful-then-forced termination.
//
// Grounded on `original_source/.../app_utils.py`'s `run_app`,
// `is_process_running`, `find_and_kill_process_by_port`.

mod launch_url;
pub mod port;
mod process_entry;

pub use process_entry::{ProcessEntry, ProcessStatus};

use std::collections::HashMap;
use std::os::unix::process::CommandExt;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::bus::{BusEvent, ProgressBus};
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

const REAP_INTERVAL: Duration = Duration::from_secs(5);
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(250);
const STOP_GRACE_PERIOD: Duration = Duration::from_secs(10);

pub enum StopOutcome {
    Stopped,
    AlreadyStopped,
    NotRunning,
}

#[derive(Clone)]
pub struct Supervisor {
    entries: Arc<Mutex<HashMap<String, ProcessEntry>>>,
    bus: ProgressBus,
}

impl Supervisor {
    pub fn new(bus: ProgressBus) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            bus,
        }
    }

    /// Spawns the app's reaper as a background task; call once at startup.
    pub fn spawn_reaper(&self) {
        let this = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(REAP_INTERVAL);
            loop {
                ticker.tick().await;
                this.reap_dead().await;
            }
        });
    }

    async fn reap_dead(&self) {
        let mut entries = self.entries.lock().await;
        for (app_id, entry) in entries.iter_mut() {
            if entry.status == ProcessStatus::Running && !process_is_alive(entry.pid) {
                entry.status = ProcessStatus::Stopped;
                self.bus.publish(BusEvent::StatusUpdate {
                    app_id: app_id.clone(),
                    status: "stopped".to_string(),
                });
            }
        }
    }

    pub async fn status(&self, app_id: &str) -> Option<ProcessStatus> {
        self.entries.lock().await.get(app_id).map(|e| e.status)
    }

    pub async fn all_statuses(&self) -> HashMap<String, ProcessStatus> {
        self.entries
            .lock()
            .await
            .iter()
            .map(|(id, e)| (id.clone(), e.status))
            .collect()
    }

    pub async fn launch_url(&self, app_id: &str) -> Option<String> {
        self.entries
            .lock()
            .await
            .get(app_id)
            .and_then(|e| e.launch_url.clone())
    }

    pub async fn last_logs(&self, app_id: &str, count: usize) -> Vec<String> {
        match self.entries.lock().await.get(app_id) {
            Some(entry) => entry.log_ring.last(count),
            None => Vec::new(),
        }
    }

    /// Launches `config.command` in a new process group via a shell,
    /// capturing merged stdout+stderr line by line.
    pub async fn start(&self, config: &AppConfig) -> AppResult<&'static str> {
        {
            let entries = self.entries.lock().await;
            if let Some(entry) = entries.get(&config.id) {
                if entry.status == ProcessStatus::Running && process_is_alive(entry.pid) {
                    return Ok("already_running");
                }
            }
        }

        let mut command = Command::new("/bin/bash");
        command
            .arg("-c")
            .arg(&config.command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Put the child in its own process group so SIGTERM/SIGKILL can
        // address every descendant together.
        unsafe {
            command.pre_exec(|| {
                libc_setsid();
                Ok(())
            });
        }

        let mut child = command
            .spawn()
            .map_err(|e| AppError::SubprocessFailed {
                code: None,
                message: format!("failed to launch {}: {e}", config.id),
            })?;

        let pid = child
            .id()
            .ok_or_else(|| AppError::SubprocessFailed {
                code: None,
                message: "child exited before pid was observed".to_string(),
            })?;

        let stdout = child.stdout.take().expect("piped stdout");
        let stderr = child.stderr.take().expect("piped stderr");

        let entry = ProcessEntry::new(pid as i32, config.port);
        self.entries.lock().await.insert(config.id.clone(), entry);

        self.bus.publish(BusEvent::StatusUpdate {
            app_id: config.id.clone(),
            status: "running".to_string(),
        });

        self.spawn_stdout_reader(config.id.clone(), config.command.clone(), config.port, stdout);
        self.spawn_stdout_reader(config.id.clone(), config.command.clone(), config.port, stderr);

        // The child handle outlives the reader tasks; detach it instead
        // of awaiting so `start` returns as soon as the process launches.
        tokio::spawn(async move {
            let _ = child.wait().await;
        });

        Ok("started")
    }

    fn spawn_stdout_reader<R>(&self, app_id: String, command: String, port: u16, reader: R)
    where
        R: tokio::io::AsyncRead + Unpin + Send + 'static,
    {
        let entries = self.entries.clone();
        let bus = self.bus.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                bus.publish(BusEvent::InstallLog {
                    app_id: app_id.clone(),
                    log: line.clone(),
                });

                let mut guard = entries.lock().await;
                if let Some(entry) = guard.get_mut(&app_id) {
                    entry.log_ring.push(line.clone());
                    if entry.launch_url.is_none() {
                        if let Some(url) = launch_url::discover(&command, port, &line) {
                            entry.launch_url = Some(url);
                        }
                    }
                }
            }
        });
    }

    /// SIGTERM, poll up to 10s, then SIGKILL.
    pub async fn stop(&self, app_id: &str) -> AppResult<StopOutcome> {
        let pid = {
            let entries = self.entries.lock().await;
            match entries.get(app_id) {
                Some(entry) if entry.status == ProcessStatus::Running => entry.pid,
                Some(_) => return Ok(StopOutcome::AlreadyStopped),
                None => return Ok(StopOutcome::NotRunning),
            }
        };

        send_signal_to_group(pid, libc::SIGTERM);

        let deadline = tokio::time::Instant::now() + STOP_GRACE_PERIOD;
        while tokio::time::Instant::now() < deadline {
            if !process_is_alive(pid) {
                break;
            }
            tokio::time::sleep(STOP_POLL_INTERVAL).await;
        }

        if process_is_alive(pid) {
            send_signal_to_group(pid, libc::SIGKILL);
        }

        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(app_id) {
            entry.status = ProcessStatus::Stopped;
        }
        self.bus.publish(BusEvent::StatusUpdate {
            app_id: app_id.to_string(),
            status: "stopped".to_string(),
        });

        Ok(StopOutcome::Stopped)
    }

    pub async fn kill_all(&self) {
        let app_ids: Vec<String> = self.entries.lock().await.keys().cloned().collect();
        for app_id in app_ids {
            let _ = self.stop(&app_id).await;
        }
    }

    /// Enumerates sockets for `port`, kills the owning process and its
    /// children. Returns true if at least one process was killed.
    pub async fn force_kill_by_port(&self, app_id: &str, configured_port: u16) -> AppResult<bool> {
        let pids = port::pids_listening_on(configured_port);
        let killed = !pids.is_empty();
        for pid in &pids {
            port::kill_with_children(*pid);
        }

        let mut entries = self.entries.lock().await;
        if let Some(entry) = entries.get_mut(app_id) {
            entry.status = ProcessStatus::Stopped;
        }
        self.bus.publish(BusEvent::StatusUpdate {
            app_id: app_id.to_string(),
            status: "stopped".to_string(),
        });

        Ok(killed)
    }
}

fn process_is_alive(pid: i32) -> bool {
    sysinfo::System::new_all()
        .process(sysinfo::Pid::from(pid as usize))
        .map(|p| !matches!(p.status(), sysinfo::ProcessStatus::Zombie))
        .unwrap_or(false)
}

fn send_signal_to_group(pid: i32, signal: i32) {
    unsafe {
        libc::kill(-pid, signal);
    }
}

unsafe fn libc_setsid() {
    libc::setsid();
}
