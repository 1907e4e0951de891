// src/installer/mod.rs
// Installer Pipeline: per-app state machine driving
// Download -> Verify -> Unpack -> Clone -> PostSetup -> WriteManifest.

pub mod bash_templates;
pub mod clone;
pub mod custom_nodes;
pub mod download;
pub mod error_kind;
pub mod manifest;
pub mod post_setup;
pub mod status;
pub mod unpack;
pub mod verify;

use std::path::Path;

use chrono::Utc;

use crate::bus::{BusEvent, ProgressBus};
use crate::config::{AppConfig, AvailableVenv, CommonSettings};
use crate::error::{AppError, AppResult};
use crate::util::sizefmt::{folder_size_kb, verifies_within_tolerance};

use error_kind::InstallerErrorKind;
use manifest::InstalledVenvManifest;
use status::{InstallState, InstallStatus, InstallStatusStore};

pub struct Installer {
    bus: ProgressBus,
    status_store: InstallStatusStore,
    workspace_root: std::path::PathBuf,
}

impl Installer {
    pub fn new(bus: ProgressBus, status_store: InstallStatusStore, workspace_root: std::path::PathBuf) -> Self {
        Self {
            bus,
            status_store,
            workspace_root,
        }
    }

    pub async fn install(
        &self,
        config: &AppConfig,
        common: &CommonSettings,
        requested_version: Option<&str>,
    ) -> AppResult<String> {
        let result = self.run(config, common, requested_version).await;

        match &result {
            Ok(message) => {
                self.status_store
                    .set(&config.id, InstallStatus { status: InstallState::Completed, progress: 100, stage: "Completed".to_string() })
                    .await?;
                self.bus.publish(BusEvent::InstallComplete {
                    app_id: config.id.clone(),
                    status: "success".to_string(),
                    message: message.clone(),
                });
            }
            Err(e) => {
                self.status_store
                    .set(&config.id, InstallStatus { status: InstallState::Failed, progress: 0, stage: current_stage_label(e) })
                    .await?;
                self.bus.publish(BusEvent::InstallComplete {
                    app_id: config.id.clone(),
                    status: "error".to_string(),
                    message: e.to_string(),
                });
            }
        }

        result
    }

    async fn run(&self, config: &AppConfig, common: &CommonSettings, requested_version: Option<&str>) -> AppResult<String> {
        let version = requested_version.unwrap_or(&config.venv_version_default);
        let venv = config
            .find_venv(version)
            .ok_or_else(|| InstallerErrorKind::VersionNotAvailable(version.to_string()))?;

        let venv_path = Path::new(&config.venv_path);
        let app_path = Path::new(&config.app_path);

        if let Some(reuse_message) = self.try_reuse_shortcut(config, venv, common)? {
            if !app_path.exists() {
                self.stage(config, "Cloning", 0).await?;
                self.do_clone(config, venv, common.verify_tolerance_percent)?;
            }
            return Ok(reuse_message);
        }

        self.stage(config, "Downloading", 0).await?;
        let resolved_url = resolve_download_url(&venv.download_url, &common.base_download_url);
        let outcome = download::download(&config.id, &resolved_url, &self.workspace_root, &self.bus).await?;

        self.stage(config, "Verifying", 0).await?;
        verify::verify(&outcome.archive_path, &venv.sha256_hash)?;

        self.stage(config, "Unpacking", 0).await?;
        unpack::unpack(
            &config.id,
            &outcome.archive_path,
            venv_path,
            venv.venv_uncompressed_size_kb * 1024,
            &self.bus,
        )?;

        if common.verify_venv_size {
            let current_kb = folder_size_kb(venv_path);
            let ok = verifies_within_tolerance(current_kb, venv.venv_uncompressed_size_kb, common.verify_tolerance_percent);
            if !ok {
                if common.delete_unverified_venv_path {
                    let _ = std::fs::remove_dir_all(venv_path);
                }
                return Err(AppError::SizeVerificationFailed(format!(
                    "venv '{}' measured {current_kb} KiB, expected {} KiB",
                    venv_path.display(),
                    venv.venv_uncompressed_size_kb
                )));
            }
        }
        let _ = std::fs::remove_file(&outcome.archive_path);

        self.stage(config, "Cloning", 0).await?;
        self.do_clone(config, venv, common.verify_tolerance_percent)?;

        if config.kind.has_custom_nodes {
            let summary = custom_nodes::install_custom_nodes(config, version, &self.bus)?;
            if !summary.failed.is_empty() {
                self.bus.publish(BusEvent::InstallLog {
                    app_id: config.id.clone(),
                    log: format!("{} custom node(s) failed: {:?}", summary.failed.len(), summary.failed),
                });
            }
        }

        self.stage(config, "PostSetup", 0).await?;
        post_setup::patch_setup_script(config, &venv.branch_name, &self.bus)?;
        post_setup::ensure_local_venv_symlink(config, &self.bus)?;

        self.stage(config, "WritingManifest", 0).await?;
        let now = Utc::now();
        manifest::write(
            venv_path,
            &InstalledVenvManifest {
                installed_venv_version: venv.version.clone(),
                installation_time: now,
                refresh_time: now,
                venv: resolved_venv(venv, &common.base_download_url),
            },
        )?;

        Ok(format!("'{}' was installed successfully.", config.id))
    }

    /// If a verified VENV already exists at the requested version, skip
    /// straight past Download/Verify/Unpack.
    fn try_reuse_shortcut(
        &self,
        config: &AppConfig,
        venv: &AvailableVenv,
        common: &CommonSettings,
    ) -> AppResult<Option<String>> {
        let venv_path = Path::new(&config.venv_path);
        let Some(existing) = manifest::read(venv_path) else {
            return Ok(None);
        };

        if existing.installed_venv_version != venv.version {
            return Ok(None);
        }

        let current_kb = folder_size_kb(venv_path);
        if !verifies_within_tolerance(current_kb, venv.venv_uncompressed_size_kb, common.verify_tolerance_percent) {
            return Ok(None);
        }

        manifest::touch_refresh(venv_path, Utc::now())?;
        Ok(Some(format!(
            "'{}' existing, verified Virtual Environment was re-used",
            config.id
        )))
    }

    fn do_clone(&self, config: &AppConfig, venv: &AvailableVenv, tolerance: u32) -> AppResult<()> {
        clone::clone_or_refresh(
            &config.id,
            config,
            venv.commit_id.as_deref(),
            if venv.branch_name.is_empty() { "master" } else { &venv.branch_name },
            venv.clone_recursive,
            venv.minimum_app_size_kb,
            tolerance,
            &self.bus,
        )
    }

    async fn stage(&self, config: &AppConfig, stage: &str, progress: u32) -> AppResult<()> {
        self.status_store
            .set(&config.id, InstallStatus { status: InstallState::InProgress, progress, stage: stage.to_string() })
            .await?;
        self.bus.publish(BusEvent::StatusUpdate {
            app_id: config.id.clone(),
            status: stage.to_lowercase(),
        });
        Ok(())
    }
}

fn resolve_download_url(download_url: &str, base_download_url: &str) -> String {
    if download_url.contains("://") {
        download_url.to_string()
    } else {
        format!("{base_download_url}{download_url}")
    }
}

fn resolved_venv(venv: &AvailableVenv, base_download_url: &str) -> AvailableVenv {
    let mut resolved = venv.clone();
    resolved.download_url = resolve_download_url(&venv.download_url, base_download_url);
    resolved
}

fn current_stage_label(_e: &AppError) -> String {
    "Failed".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_download_url() {
        let url = resolve_download_url("bcomfy/bcomfy.tar.gz", "https://better.s3.madiator.com/");
        assert_eq!(url, "https://better.s3.madiator.com/bcomfy/bcomfy.tar.gz");
    }

    #[test]
    fn keeps_absolute_download_url() {
        let url = resolve_download_url("https://other.example/x.tar.gz", "https://better.s3.madiator.com/");
        assert_eq!(url, "https://other.example/x.tar.gz");
    }
}
