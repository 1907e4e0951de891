// src/config/store.rs
// Loads and merges the JSON manifest into an in-memory AppConfig registry.
//
// Precedence (lowest to highest): code defaults -> remote manifest URL ->
// local file override -> environment-variable overrides -> debug-settings
// override file. Grounded on the original source's `init_app_configs()`
// / `app_configs.py` loading chain.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use serde_json::Value;
use tracing::{info, warn};

use crate::config::model::{AppConfig, CommonSettings, ConfigManifest};
use crate::error::AppResult;

const NOT_FOUND_SENTINEL: &str = "#not_found_using_code_defaults";

pub struct ConfigStore {
    manifest_url: String,
    local_override_path: Option<PathBuf>,
    debug_settings_path: PathBuf,
    http: reqwest::Client,
}

/// Effective result of a `ConfigStore::load()` call.
pub struct LoadedConfig {
    pub apps: HashMap<String, AppConfig>,
    pub common: CommonSettings,
    /// The manifest URL actually used, annotated with the sentinel when
    /// the remote fetch failed and code defaults were used instead.
    pub effective_manifest_url: String,
}

impl ConfigStore {
    pub fn new() -> Self {
        let manifest_url = env::var("APP_CONFIGS_MANIFEST_URL")
            .unwrap_or_else(|_| "https://launchdeck.example.invalid/app_configs.json".to_string());
        let local_override_path = env::var("APP_CONFIGS_LOCAL_FILE").ok().map(PathBuf::from);
        let debug_settings_path = env::var("DEBUG_SETTINGS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/workspace/debug_settings.json"));

        Self {
            manifest_url,
            local_override_path,
            debug_settings_path,
            http: reqwest::Client::new(),
        }
    }

    /// Idempotent; callable at any time. The Installer calls this at the
    /// start of each install to pick up runtime edits.
    pub async fn load(&self) -> AppResult<LoadedConfig> {
        let mut manifest = code_defaults();
        let mut effective_manifest_url = self.manifest_url.clone();

        match self.fetch_remote_manifest().await {
            Ok(Some(remote)) => {
                info!(url = %self.manifest_url, "loaded app configs from remote manifest");
                manifest = remote;
            }
            Ok(None) => {
                // no manifest URL configured; keep code defaults silently
            }
            Err(e) => {
                warn!(url = %self.manifest_url, error = %e, "manifest fetch failed, falling back to code defaults");
                effective_manifest_url = format!("{}{}", self.manifest_url, NOT_FOUND_SENTINEL);
            }
        }

        if let Some(path) = &self.local_override_path {
            if path.exists() {
                let raw = std::fs::read_to_string(path)?;
                manifest = serde_json::from_str(&raw)?;
                info!(path = %path.display(), "applied local config override");
            }
        }

        self.apply_env_overrides(&mut manifest);
        self.apply_debug_overrides(&mut manifest)?;

        if manifest.common.base_download_url.is_empty() {
            manifest.common.base_download_url = derive_base_download_url(&effective_manifest_url);
        }

        let apps = manifest
            .apps
            .into_iter()
            .map(|app| (app.id.clone(), app))
            .collect();

        Ok(LoadedConfig {
            apps,
            common: manifest.common,
            effective_manifest_url,
        })
    }

    async fn fetch_remote_manifest(&self) -> AppResult<Option<ConfigManifest>> {
        if self.manifest_url.is_empty() {
            return Ok(None);
        }
        let resp = self.http.get(&self.manifest_url).send().await?;
        let resp = resp.error_for_status()?;
        let manifest: ConfigManifest = resp.json().await?;
        Ok(Some(manifest))
    }

    /// `VENV_VERSION_<APP_ID>` overrides `venv_version_default` per app.
    fn apply_env_overrides(&self, manifest: &mut ConfigManifest) {
        for app in manifest.apps.iter_mut() {
            let key = format!("VENV_VERSION_{}", app.id.to_uppercase());
            if let Ok(version) = env::var(&key) {
                app.venv_version_default = version;
            }
        }
    }

    fn apply_debug_overrides(&self, manifest: &mut ConfigManifest) -> AppResult<()> {
        if !self.debug_settings_path.exists() {
            return Ok(());
        }
        let raw = std::fs::read_to_string(&self.debug_settings_path)?;
        let debug: Value = serde_json::from_str(&raw)?;

        if let Some(map) = debug.get("venv_version_overrides").and_then(Value::as_object) {
            for app in manifest.apps.iter_mut() {
                if let Some(version) = map.get(&app.id).and_then(Value::as_str) {
                    app.venv_version_default = version.to_string();
                }
            }
        }

        Ok(())
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

/// `base_download_url` default rule: if unset, derive from the directory
/// portion of the manifest URL, with a trailing slash.
fn derive_base_download_url(manifest_url: &str) -> String {
    let clean = manifest_url.trim_end_matches(NOT_FOUND_SENTINEL);
    match clean.rfind('/') {
        Some(idx) => format!("{}/", &clean[..idx]),
        None => clean.to_string(),
    }
}

fn code_defaults() -> ConfigManifest {
    use crate::config::model::AvailableVenv;

    let comfy_venv = AvailableVenv {
        version: "official".to_string(),
        branch_name: String::new(),
        commit_id: None,
        clone_recursive: false,
        download_url: "bcomfy/bcomfy.tar.gz".to_string(),
        archive_size_bytes: 3_179_595_118,
        venv_uncompressed_size_kb: 6_011_030,
        minimum_app_size_kb: 100_000,
        sha256_hash: "7fd60808a120a1dd05287c2a9b3d38b3bdece84f085abc156e0a2ee8e6254b84".to_string(),
        build_info: "Better ComfyUI official build".to_string(),
        notes: String::new(),
    };

    let comfy = AppConfig {
        id: "ComfyUI".to_string(),
        display_name: "Better ComfyUI".to_string(),
        port: 3000,
        command: "cd /workspace/bcomfy && . ./bin/activate && cd /workspace/ComfyUI && python main.py --listen --port 3000 --enable-cors-header".to_string(),
        app_path: "/workspace/ComfyUI".to_string(),
        venv_path: "/workspace/bcomfy".to_string(),
        repo_url: "https://github.com/comfyanonymous/ComfyUI.git".to_string(),
        allow_refresh: false,
        venv_version_default: "official".to_string(),
        available_venvs: vec![comfy_venv],
        custom_nodes: Some(vec![
            crate::config::model::CustomNode {
                name: "ComfyUI-Manager".to_string(),
                path: "ComfyUI-Manager".to_string(),
                repo_url: "https://github.com/ltdrdata/ComfyUI-Manager.git".to_string(),
                venv_version: "*".to_string(),
                install_requirements_txt: true,
                clone_recursive: false,
            },
            crate::config::model::CustomNode {
                name: "ComfyUI-Essentials".to_string(),
                path: "ComfyUI_essentials".to_string(),
                repo_url: "https://github.com/cubiq/ComfyUI_essentials".to_string(),
                venv_version: "*".to_string(),
                install_requirements_txt: true,
                clone_recursive: false,
            },
        ]),
        bash_cmds: HashMap::from([
            (
                "fix-custom_nodes".to_string(),
                "comfy --skip-prompt --no-enable-telemetry set-default {app_path} && comfy node restore-dependencies".to_string(),
            ),
            ("install-comfy-CLI".to_string(), "pip install comfy-cli".to_string()),
            ("pip-clean-up".to_string(), "pip cache purge".to_string()),
        ]),
        kind: crate::config::model::AppKind {
            has_custom_nodes: true,
            needs_local_venv_symlink: false,
            needs_setup_script_patch: false,
            discovers_launch_url: false,
        },
    };

    let kohya_venv = AvailableVenv {
        version: "official".to_string(),
        branch_name: "sd3-flux.1".to_string(),
        commit_id: None,
        clone_recursive: true,
        download_url: "bkohya/bkohya.tar.gz".to_string(),
        archive_size_bytes: 6_295_309_068,
        venv_uncompressed_size_kb: 11_907_000,
        minimum_app_size_kb: 50_000,
        sha256_hash: String::new(),
        build_info: "Better Kohya official build".to_string(),
        notes: String::new(),
    };

    let kohya = AppConfig {
        id: "kohya_ss".to_string(),
        display_name: "Better Kohya".to_string(),
        port: 7860,
        command: "cd /workspace/bkohya && . ./bin/activate && cd /workspace/kohya_ss && ./gui.sh --listen --port 7860".to_string(),
        app_path: "/workspace/kohya_ss".to_string(),
        venv_path: "/workspace/bkohya".to_string(),
        repo_url: "https://github.com/bmaltais/kohya_ss.git".to_string(),
        allow_refresh: false,
        venv_version_default: "official".to_string(),
        available_venvs: vec![kohya_venv],
        custom_nodes: None,
        bash_cmds: HashMap::new(),
        kind: crate::config::model::AppKind {
            has_custom_nodes: false,
            needs_local_venv_symlink: true,
            needs_setup_script_patch: true,
            discovers_launch_url: true,
        },
    };

    ConfigManifest {
        apps: vec![comfy, kohya],
        common: CommonSettings::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_base_url_from_manifest_directory() {
        let url = derive_base_download_url("https://example.com/configs/app_configs.json");
        assert_eq!(url, "https://example.com/configs/");
    }

    #[test]
    fn derives_base_url_ignoring_sentinel() {
        let url = derive_base_download_url(
            "https://example.com/configs/app_configs.json#not_found_using_code_defaults",
        );
        assert_eq!(url, "https://example.com/configs/");
    }

    #[test]
    fn code_defaults_have_unique_ports() {
        let manifest = code_defaults();
        let mut ports: Vec<u16> = manifest.apps.iter().map(|a| a.port).collect();
        ports.sort();
        ports.dedup();
        assert_eq!(ports.len(), manifest.apps.len());
    }
}
