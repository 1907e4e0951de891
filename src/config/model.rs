// src/config/model.rs
// Data model for section 3 ("Data Model") of the spec.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Capability flags replacing the original's special-casing of one app id
/// (REDESIGN FLAGS, spec section 9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppKind {
    #[serde(default)]
    pub has_custom_nodes: bool,
    #[serde(default)]
    pub needs_local_venv_symlink: bool,
    #[serde(default)]
    pub needs_setup_script_patch: bool,
    #[serde(default)]
    pub discovers_launch_url: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomNode {
    pub name: String,
    pub path: String,
    pub repo_url: String,
    /// "*" matches any installed venv version, or an exact version tag.
    pub venv_version: String,
    #[serde(default)]
    pub install_requirements_txt: bool,
    #[serde(default)]
    pub clone_recursive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableVenv {
    pub version: String,
    #[serde(default)]
    pub branch_name: String,
    #[serde(default)]
    pub commit_id: Option<String>,
    #[serde(default)]
    pub clone_recursive: bool,
    pub download_url: String,
    pub archive_size_bytes: u64,
    pub venv_uncompressed_size_kb: u64,
    pub minimum_app_size_kb: u64,
    #[serde(default)]
    pub sha256_hash: String,
    #[serde(default)]
    pub build_info: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub id: String,
    pub display_name: String,
    pub port: u16,
    pub command: String,
    pub app_path: String,
    pub venv_path: String,
    pub repo_url: String,
    #[serde(default)]
    pub allow_refresh: bool,
    pub venv_version_default: String,
    pub available_venvs: Vec<AvailableVenv>,
    #[serde(default)]
    pub custom_nodes: Option<Vec<CustomNode>>,
    #[serde(default)]
    pub bash_cmds: HashMap<String, String>,
    #[serde(default)]
    pub kind: AppKind,
}

impl AppConfig {
    pub fn find_venv(&self, version: &str) -> Option<&AvailableVenv> {
        self.available_venvs.iter().find(|v| v.version == version)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommonSettings {
    pub base_download_url: String,
    #[serde(default = "default_true")]
    pub verify_app_size: bool,
    #[serde(default = "default_true")]
    pub verify_venv_size: bool,
    #[serde(default)]
    pub delete_unverified_app_path: bool,
    #[serde(default)]
    pub delete_unverified_venv_path: bool,
    #[serde(default = "default_tolerance")]
    pub verify_tolerance_percent: u32,
}

fn default_true() -> bool {
    true
}

fn default_tolerance() -> u32 {
    5
}

impl Default for CommonSettings {
    fn default() -> Self {
        Self {
            base_download_url: String::new(),
            verify_app_size: true,
            verify_venv_size: true,
            delete_unverified_app_path: false,
            delete_unverified_venv_path: false,
            verify_tolerance_percent: 5,
        }
    }
}

/// Wire format of the remote/local manifest document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigManifest {
    #[serde(default)]
    pub apps: Vec<AppConfig>,
    #[serde(default)]
    pub common: CommonSettings,
}
