// src/mapping/store.rs
// For each of the three mapping documents: read the existing file, or
// write the code default and return it. Never overwrites an existing
// file when re-initializing.

use std::path::Path;

use crate::error::AppResult;
use crate::path_manager::PathManager;
use crate::util::jsonio::read_json_or_default;

use super::{defaults, AppInstallDirs, SharedModelAppMap, SharedModelFolders};

/// The three mapping documents loaded together, plus whether each one
/// already existed on disk at load time.
pub struct MappingSet {
    pub folders: SharedModelFolders,
    pub folders_loaded_from_file: bool,
    pub install_dirs: AppInstallDirs,
    pub install_dirs_loaded_from_file: bool,
    pub app_map: SharedModelAppMap,
    pub app_map_loaded_from_file: bool,
}

#[derive(Clone)]
pub struct MappingStore {
    paths: PathManager,
    hidden: bool,
}

impl MappingStore {
    pub fn new(paths: PathManager, hidden: bool) -> Self {
        Self { paths, hidden }
    }

    /// Reads (or seeds) all three documents and validates the
    /// cross-mapping invariants before returning.
    pub fn load(&self) -> AppResult<MappingSet> {
        let (folders_loaded_from_file, folders) = self.load_folders()?;
        let (install_dirs_loaded_from_file, install_dirs) = self.load_install_dirs()?;
        let (app_map_loaded_from_file, app_map) = self.load_app_map()?;

        super::validate(&folders, &install_dirs, &app_map)
            .map_err(crate::error::AppError::PreconditionFailed)?;

        Ok(MappingSet {
            folders,
            folders_loaded_from_file,
            install_dirs,
            install_dirs_loaded_from_file,
            app_map,
            app_map_loaded_from_file,
        })
    }

    pub fn load_folders(&self) -> AppResult<(bool, SharedModelFolders)> {
        read_json_or_default(&self.file_path("_shared_model_folders"), defaults::shared_model_folders())
    }

    pub fn load_install_dirs(&self) -> AppResult<(bool, AppInstallDirs)> {
        read_json_or_default(&self.file_path("_app_install_dirs"), defaults::app_install_dirs())
    }

    pub fn load_app_map(&self) -> AppResult<(bool, SharedModelAppMap)> {
        read_json_or_default(&self.file_path("_shared_model_app_map"), defaults::shared_model_app_map())
    }

    fn file_path(&self, name: &str) -> std::path::PathBuf {
        self.paths.mapping_file(name, self.hidden)
    }

    pub fn shared_models_dir(&self) -> &Path {
        self.paths.shared_models_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> MappingStore {
        std::env::set_var("WORKSPACE_ROOT", dir);
        let paths = PathManager::new().unwrap();
        MappingStore::new(paths, false)
    }

    #[test]
    fn seeds_defaults_on_first_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let set = store.load().unwrap();
        assert!(!set.folders_loaded_from_file);
        assert!(!set.install_dirs_loaded_from_file);
        assert!(!set.app_map_loaded_from_file);
        assert!(set.folders.contains_key("ckpt"));
    }

    #[test]
    fn second_load_reads_seeded_file_unmodified() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.load().unwrap();

        let second = store.load().unwrap();
        assert!(second.folders_loaded_from_file);
        assert!(second.install_dirs_loaded_from_file);
        assert!(second.app_map_loaded_from_file);
    }
}
