// src/reconciler/cell.rs
// Per-(model_type, app_name) cell algorithms: reap broken links,
// pull back stray files, materialize links. Grounded on
// `remove_broken_model_symlinks`, `pull_unlinked_models_back_as_shared_models`,
// and `create_model_symlinks` in `shared_models.py`.

use std::fs;
use std::os::unix::fs::symlink;
use std::path::Path;

use chrono::Utc;

use crate::error::AppResult;
use crate::reconciler::ReconcileCounters;

const README_PREFIX: &str = "_readme-";
const MIN_MODEL_FILE_BYTES: u64 = 100;

fn readme_type_name(model_type: &str) -> String {
    model_type.replace('/', "-")
}

/// Plain file-symlink rule cell.
pub fn reconcile_plain_rule(
    shared_type_dir: &Path,
    dest_dir: &Path,
    model_type: &str,
    disable_pullback: bool,
) -> AppResult<ReconcileCounters> {
    fs::create_dir_all(dest_dir)?;
    fs::create_dir_all(shared_type_dir)?;

    let mut counters = ReconcileCounters::default();
    counters.broken_removed = reap_broken_links(dest_dir, model_type)?;

    if !disable_pullback {
        counters.pulled = pull_back(shared_type_dir, dest_dir, model_type)?;
    }

    counters.files_created = materialize_links(shared_type_dir, dest_dir, model_type)?;

    Ok(counters)
}

/// Folder-symlink rule cell: strip `/*`, link the whole shared subtree
/// as one directory symlink. Returns 1 if a link was created, else 0.
pub fn reconcile_folder_rule(shared_dir: &Path, dest: &Path) -> AppResult<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    if shared_dir.is_dir() && !dest.exists() {
        symlink(shared_dir, dest)?;
        return Ok(1);
    }

    Ok(0)
}

fn reap_broken_links(dest_dir: &Path, model_type: &str) -> AppResult<u64> {
    let mut count = 0u64;
    let mut info = String::new();

    for entry in fs::read_dir(dest_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_symlink = path.symlink_metadata().map(|m| m.file_type().is_symlink()).unwrap_or(false);
        if is_symlink && !path.exists() {
            count += 1;
            info.push_str(&format!(
                "\t{}\t[@ {}]\n",
                entry.file_name().to_string_lossy(),
                Utc::now().to_rfc2822()
            ));

            if fs::remove_file(&path).is_err() {
                let _ = fs::remove_dir_all(&path);
            }
        }
    }

    if count > 0 {
        append_readme(
            dest_dir,
            &format!("{README_PREFIX}brokenlinks-{}.txt", readme_type_name(model_type)),
            "Following broken model file links have been found and where deleted from this directory:\n\n",
            &info,
        )?;
    }

    Ok(count)
}

fn pull_back(shared_type_dir: &Path, dest_dir: &Path, model_type: &str) -> AppResult<u64> {
    let mut count = 0u64;
    let mut info = String::new();

    for entry in fs::read_dir(dest_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') || name.starts_with(README_PREFIX) {
            continue;
        }

        let path = entry.path();
        let is_symlink = path.symlink_metadata().map(|m| m.file_type().is_symlink()).unwrap_or(false);
        if is_symlink || path.is_dir() {
            continue;
        }
        let size = entry.metadata()?.len();
        if size == 0 {
            continue;
        }

        let shared_path = shared_type_dir.join(&name);
        fs::rename(&path, &shared_path)?;
        count += 1;
        info.push_str(&format!("\t{name}\t[@ {}]\n", Utc::now().to_rfc2822()));

        if shared_path.is_file() && !path.exists() {
            symlink(&shared_path, &path)?;
        }
    }

    if count > 0 {
        append_readme(
            dest_dir,
            &format!("{README_PREFIX}pulled-{}.txt", readme_type_name(model_type)),
            &format!(
                "Following model files have been pulled from this directory into the shared_models directory '{}' and re-linked here:\n\n",
                shared_type_dir.display()
            ),
            &info,
        )?;
    }

    Ok(count)
}

fn materialize_links(shared_type_dir: &Path, dest_dir: &Path, model_type: &str) -> AppResult<u64> {
    let mut created = 0u64;
    let mut synced_readme_written = false;

    for entry in fs::read_dir(shared_type_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let src_path = entry.path();

        if name.starts_with('.') {
            continue;
        }

        if let Some(stripped) = name.strip_prefix(README_PREFIX) {
            if !synced_readme_written {
                let synced_name = format!("{README_PREFIX}synced-{stripped}");
                fs::write(
                    dest_dir.join(&synced_name),
                    format!(
                        "This folder is synced from the shared_models '{model_type}' models type sub-folder at '{}'.\n\nConsider to put such models there to share them across apps, instead of putting them here!",
                        shared_type_dir.display()
                    ),
                )?;
                synced_readme_written = true;
            }
            continue;
        }

        if src_path.is_dir() {
            // Sub-folders require an explicit grouping rule to be mapped.
            continue;
        }

        let size = entry.metadata()?.len();
        if size < MIN_MODEL_FILE_BYTES {
            continue;
        }

        let dst_path = dest_dir.join(&name);
        if !dst_path.exists() {
            symlink(&src_path, &dst_path)?;
            created += 1;
        }
    }

    Ok(created)
}

fn append_readme(dir: &Path, filename: &str, header: &str, body: &str) -> AppResult<()> {
    use std::io::Write;

    let path = dir.join(filename);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)?;

    if path.metadata().map(|m| m.len()).unwrap_or(0) == 0 {
        file.write_all(header.as_bytes())?;
    }
    file.write_all(body.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materializes_and_is_idempotent() {
        let shared = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();

        std::fs::write(shared.path().join("model.safetensors"), vec![0u8; 200]).unwrap();

        let first = reconcile_plain_rule(shared.path(), dest.path(), "loras", false).unwrap();
        assert_eq!(first.files_created, 1);
        assert!(dest.path().join("model.safetensors").is_symlink());

        let second = reconcile_plain_rule(shared.path(), dest.path(), "loras", false).unwrap();
        assert_eq!(second.files_created, 0);
        assert_eq!(second.broken_removed, 0);
        assert_eq!(second.pulled, 0);
    }

    #[test]
    fn skips_placeholder_files_under_100_bytes() {
        let shared = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        std::fs::write(shared.path().join("put-model-here.txt"), vec![0u8; 10]).unwrap();

        let counters = reconcile_plain_rule(shared.path(), dest.path(), "loras", false).unwrap();
        assert_eq!(counters.files_created, 0);
        assert!(!dest.path().join("put-model-here.txt").exists());
    }

    #[test]
    fn pulls_back_stray_file_and_relinks() {
        let shared = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        std::fs::write(dest.path().join("foo.safetensors"), vec![1u8; 1024]).unwrap();

        let counters = reconcile_plain_rule(shared.path(), dest.path(), "loras", false).unwrap();
        assert_eq!(counters.pulled, 1);
        assert!(shared.path().join("foo.safetensors").is_file());
        assert!(dest.path().join("foo.safetensors").is_symlink());
        assert!(dest.path().join("_readme-pulled-loras.txt").exists());
    }

    #[test]
    fn reaps_broken_symlink() {
        let shared = tempfile::tempdir().unwrap();
        let dest = tempfile::tempdir().unwrap();
        let target = shared.path().join("gone.ckpt");
        std::fs::write(&target, vec![1u8; 200]).unwrap();
        symlink(&target, dest.path().join("gone.ckpt")).unwrap();
        std::fs::remove_file(&target).unwrap();

        let counters = reconcile_plain_rule(shared.path(), dest.path(), "ckpt", false).unwrap();
        assert_eq!(counters.broken_removed, 1);
        assert!(!dest.path().join("gone.ckpt").exists());
        assert!(dest.path().join("_readme-brokenlinks-ckpt.txt").exists());
    }

    #[test]
    fn folder_rule_creates_directory_symlink() {
        let shared = tempfile::tempdir().unwrap();
        let llm_dir = shared.path().join("LLM").join("Meta-Llama-3.1-8B");
        std::fs::create_dir_all(&llm_dir).unwrap();
        std::fs::write(llm_dir.join("model.bin"), vec![1u8; 200]).unwrap();

        let app_dir = tempfile::tempdir().unwrap();
        let dest = app_dir.path().join("model");

        let created = reconcile_folder_rule(&llm_dir, &dest).unwrap();
        assert_eq!(created, 1);
        assert!(dest.is_symlink());
    }
}
