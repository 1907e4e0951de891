// src/reconciler/folders.rs
// Materializes the shared folder tree and seeds per-type README files.
// Grounded on `ensure_shared_models_folders()` in `shared_models.py`.

use std::fs;
use std::path::Path;

use crate::error::AppResult;
use crate::mapping::SharedModelFolders;

const README_PREFIX: &str = "_readme-";

pub fn ensure_shared_folders(shared_root: &Path, folders: &SharedModelFolders) -> AppResult<()> {
    fs::create_dir_all(shared_root)?;

    let readme_path = shared_root.join("__README.txt");
    let mut readme = String::from("Upload your models to the appropriate folders:\n\n");

    for (model_type, description) in folders {
        let type_dir = shared_root.join(model_type.trim_end_matches("/*"));
        fs::create_dir_all(&type_dir)?;

        let singular = model_type.strip_suffix('s').unwrap_or(model_type);
        let type_readme_name = format!("{README_PREFIX}{}.txt", model_type.replace('/', "-"));
        fs::write(
            type_dir.join(type_readme_name),
            format!("Put your '{singular}' type models here, {description}"),
        )?;

        readme.push_str(&format!("- {model_type}: for {singular} models, {description}\n"));
    }

    readme.push_str("\nThese models will be automatically linked to all supported apps.\n\n");
    readme.push_str("Models directly downloaded into an app model folder will be\n");
    readme.push_str("automatically pulled back into the corresponding shared folder and relinked back!\n");

    fs::write(readme_path, readme)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_type_folders_and_readmes() {
        let dir = tempfile::tempdir().unwrap();
        let mut folders = SharedModelFolders::new();
        folders.insert("ckpt".to_string(), "Model Checkpoint".to_string());
        folders.insert("loras/flux".to_string(), "Flux LoRA".to_string());

        ensure_shared_folders(dir.path(), &folders).unwrap();

        assert!(dir.path().join("ckpt").is_dir());
        assert!(dir.path().join("loras/flux").is_dir());
        assert!(dir.path().join("ckpt/_readme-ckpt.txt").exists());
        assert!(dir.path().join("loras/flux/_readme-loras-flux.txt").exists());
        assert!(dir.path().join("__README.txt").exists());
    }
}
