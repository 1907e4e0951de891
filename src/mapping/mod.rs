// src/mapping/mod.rs
// Mapping Store: the three on-disk JSON documents consumed by the
// Reconciler and Installer. Grounded on
// `original_source/.../shared_models.py`'s module-level dicts.

pub mod defaults;
pub mod store;

pub use store::{MappingSet, MappingStore};

use std::collections::BTreeMap;

/// `model_type -> description`. May contain one `/` for sub-grouping
/// (e.g. `loras/flux`) and may end in `/*` to denote a folder-symlink type.
pub type SharedModelFolders = BTreeMap<String, String>;

/// `app_name -> absolute install dir`, including user-declared CUSTOM apps.
pub type AppInstallDirs = BTreeMap<String, String>;

/// `model_type -> app_name -> app_relative_path`. The relative path may
/// terminate in `/*` to request folder-symlink semantics at the destination.
pub type SharedModelAppMap = BTreeMap<String, BTreeMap<String, String>>;

/// Validates the cross-mapping invariants from the data model section:
/// every app referenced by the app-map exists in install dirs, and every
/// top-level model type exists in the folders catalog.
pub fn validate(
    folders: &SharedModelFolders,
    install_dirs: &AppInstallDirs,
    app_map: &SharedModelAppMap,
) -> Result<(), String> {
    for model_type in app_map.keys() {
        if !folders.contains_key(model_type) {
            return Err(format!(
                "model_type '{model_type}' in SharedModelAppMap has no entry in SharedModelFolders"
            ));
        }
    }

    for (model_type, per_app) in app_map {
        for app_name in per_app.keys() {
            if !install_dirs.contains_key(app_name) {
                return Err(format!(
                    "app '{app_name}' referenced by model_type '{model_type}' has no entry in AppInstallDirs"
                ));
            }
        }
    }

    Ok(())
}
