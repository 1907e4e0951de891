// Exercises the installer's reuse shortcut end-to-end (spec scenario:
// "First-time install reuse shortcut") without touching the network:
// a verified .venv_info.json plus a venv folder within tolerance must
// make `Installer::install` skip straight to a success message.

use std::collections::HashMap;

use chrono::Utc;

use launchdeck::bus::ProgressBus;
use launchdeck::config::{AppConfig, AppKind, AvailableVenv, CommonSettings};
use launchdeck::installer::manifest::{self, InstalledVenvManifest};
use launchdeck::installer::status::InstallStatusStore;
use launchdeck::installer::Installer;
use launchdeck::util::sizefmt::folder_size_kb;

fn sample_venv(expected_kb: u64) -> AvailableVenv {
    AvailableVenv {
        version: "v1".to_string(),
        branch_name: String::new(),
        commit_id: None,
        clone_recursive: false,
        download_url: "app/app.tar.gz".to_string(),
        archive_size_bytes: 1_000_000,
        venv_uncompressed_size_kb: expected_kb,
        minimum_app_size_kb: 10,
        sha256_hash: String::new(),
        build_info: String::new(),
        notes: String::new(),
    }
}

#[tokio::test]
async fn reuses_verified_venv_without_downloading() {
    let workspace = tempfile::tempdir().unwrap();
    let app_path = workspace.path().join("app");
    let venv_path = workspace.path().join("venv");
    std::fs::create_dir_all(&app_path).unwrap();
    std::fs::create_dir_all(&venv_path).unwrap();
    std::fs::write(venv_path.join("payload.bin"), vec![0u8; 5_000]).unwrap();

    let current_kb = folder_size_kb(&venv_path);
    let venv = sample_venv(current_kb);

    let now = Utc::now();
    manifest::write(
        &venv_path,
        &InstalledVenvManifest {
            installed_venv_version: venv.version.clone(),
            installation_time: now,
            refresh_time: now,
            venv: venv.clone(),
        },
    )
    .unwrap();

    let config = AppConfig {
        id: "TestApp".to_string(),
        display_name: "Test App".to_string(),
        port: 9999,
        command: "true".to_string(),
        app_path: app_path.to_string_lossy().to_string(),
        venv_path: venv_path.to_string_lossy().to_string(),
        repo_url: "https://example.invalid/test.git".to_string(),
        allow_refresh: false,
        venv_version_default: "v1".to_string(),
        available_venvs: vec![venv],
        custom_nodes: None,
        bash_cmds: HashMap::new(),
        kind: AppKind::default(),
    };

    let common = CommonSettings {
        base_download_url: "https://example.invalid/".to_string(),
        verify_tolerance_percent: 5,
        ..CommonSettings::default()
    };

    let status_store = InstallStatusStore::load(&workspace.path().join("install_status.json")).unwrap();
    let installer = Installer::new(ProgressBus::new(), status_store.clone(), workspace.path().to_path_buf());

    let message = installer.install(&config, &common, None).await.unwrap();
    assert!(message.contains("existing, verified Virtual Environment was re-used"), "{message}");

    let status = status_store.get("TestApp").await;
    assert_eq!(status.progress, 100);

    let reloaded = manifest::read(&venv_path).unwrap();
    assert_eq!(reloaded.installation_time, now);
    assert!(reloaded.refresh_time >= now);
}
