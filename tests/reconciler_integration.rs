// Exercises the full Reconciler dispatch (not just the per-cell helpers
// in src/reconciler/cell.rs): mapping load, plain-rule pull-back/reap,
// and folder-rule symlinking, all through `Reconciler::reconcile`.

use std::os::unix::fs::symlink;

use launchdeck::bus::ProgressBus;
use launchdeck::mapping::MappingStore;
use launchdeck::path_manager::PathManager;
use launchdeck::reconciler::Reconciler;

fn mapping_store_in(workspace_root: &std::path::Path) -> MappingStore {
    std::env::set_var("WORKSPACE_ROOT", workspace_root);
    let paths = PathManager::new().unwrap();
    MappingStore::new(paths, false)
}

fn write_mapping_files(shared_root: &std::path::Path, workspace_root: &std::path::Path) {
    std::fs::create_dir_all(shared_root).unwrap();

    let folders = serde_json::json!({
        "loras": "LoRA model",
        "ckpt": "Checkpoint model",
        "LLM/Meta-Llama-3.1-8B/*": "folder-mapped LLM",
    });
    std::fs::write(
        shared_root.join("_shared_model_folders.json"),
        serde_json::to_string_pretty(&folders).unwrap(),
    )
    .unwrap();

    let install_dirs = serde_json::json!({
        "ComfyUI": workspace_root.join("ComfyUI").to_string_lossy(),
        "A1111": workspace_root.join("stable-diffusion-webui").to_string_lossy(),
        "CUSTOM1": workspace_root.join("joy-caption-batch").to_string_lossy(),
    });
    std::fs::write(
        shared_root.join("_app_install_dirs.json"),
        serde_json::to_string_pretty(&install_dirs).unwrap(),
    )
    .unwrap();

    let app_map = serde_json::json!({
        "loras": {"ComfyUI": "/models/loras"},
        "ckpt": {"A1111": "/models/Stable-diffusion"},
        "LLM/Meta-Llama-3.1-8B/*": {"CUSTOM1": "/model/*"},
    });
    std::fs::write(
        shared_root.join("_shared_model_app_map.json"),
        serde_json::to_string_pretty(&app_map).unwrap(),
    )
    .unwrap();
}

#[tokio::test]
async fn reconcile_runs_pullback_reap_and_folder_rule_together() {
    let workspace = tempfile::tempdir().unwrap();
    let shared_root = workspace.path().join("shared_models");
    write_mapping_files(&shared_root, workspace.path());

    // Scenario: pull-back cycle. A stray, non-symlink file dropped
    // straight into ComfyUI's loras destination.
    let loras_dest = workspace.path().join("ComfyUI/models/loras");
    std::fs::create_dir_all(&loras_dest).unwrap();
    std::fs::write(loras_dest.join("foo.safetensors"), vec![7u8; 10 * 1024 * 1024]).unwrap();

    // Scenario: broken-link reap. A1111's checkpoint dir has a dangling
    // symlink into the shared ckpt folder.
    let ckpt_dest = workspace.path().join("stable-diffusion-webui/models/Stable-diffusion");
    std::fs::create_dir_all(&ckpt_dest).unwrap();
    let ckpt_shared_dir = shared_root.join("ckpt");
    std::fs::create_dir_all(&ckpt_shared_dir).unwrap();
    symlink(ckpt_shared_dir.join("x.ckpt"), ckpt_dest.join("x.ckpt")).unwrap();

    // Scenario: folder rule. A whole directory of LLM files shared as
    // one unit with CUSTOM1.
    let llm_shared_dir = shared_root.join("LLM/Meta-Llama-3.1-8B");
    std::fs::create_dir_all(&llm_shared_dir).unwrap();
    std::fs::write(llm_shared_dir.join("config.json"), b"{}").unwrap();

    let mapping = mapping_store_in(workspace.path());
    let reconciler = Reconciler::new(mapping, ProgressBus::new(), false);

    let counters = reconciler.reconcile().await.unwrap();
    assert_eq!(counters.pulled, 1);
    assert_eq!(counters.broken_removed, 1);
    assert_eq!(counters.folders_created, 1);

    assert!(shared_root.join("loras/foo.safetensors").is_file());
    assert!(loras_dest.join("foo.safetensors").is_symlink());
    assert!(!ckpt_dest.join("x.ckpt").exists());

    let custom1_model_dir = workspace.path().join("joy-caption-batch/model");
    assert!(custom1_model_dir.is_symlink());
    assert!(custom1_model_dir.join("config.json").exists());

    // Idempotence: a second run with no external changes does nothing new.
    let second = reconciler.reconcile().await.unwrap();
    assert_eq!(second.pulled, 0);
    assert_eq!(second.broken_removed, 0);
    assert_eq!(second.folders_created, 0);
}

#[tokio::test]
async fn reconcile_fails_precondition_when_shared_root_missing() {
    let workspace = tempfile::tempdir().unwrap();
    std::env::set_var("WORKSPACE_ROOT", workspace.path());
    let paths = PathManager::new().unwrap();
    let mapping = MappingStore::new(paths, false);
    let reconciler = Reconciler::new(mapping, ProgressBus::new(), false);

    let result = reconciler.reconcile().await;
    assert!(result.is_err());
}
