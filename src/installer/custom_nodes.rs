// src/installer/custom_nodes.rs
// Custom-node sub-stage: only for apps whose AppKind.has_custom_nodes is
// set (the original special-cased the ComfyUI app id here).

use std::path::Path;

use git2::Repository;

use crate::bus::{BusEvent, ProgressBus};
use crate::config::{AppConfig, CustomNode};
use crate::error::AppResult;
use crate::installer::bash_templates::run_template;

pub struct CustomNodeSummary {
    pub installed: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Clones (or leaves alone if present) every custom node whose
/// `venv_version` is `*` or matches `chosen_version`. Node failures are
/// aggregated into the summary rather than aborting the install. Always
/// runs the `install-comfy-CLI` and `pip-clean-up` templates afterward.
pub fn install_custom_nodes(config: &AppConfig, chosen_version: &str, bus: &ProgressBus) -> AppResult<CustomNodeSummary> {
    let mut summary = CustomNodeSummary {
        installed: Vec::new(),
        failed: Vec::new(),
    };

    let Some(nodes) = &config.custom_nodes else {
        return Ok(summary);
    };

    let custom_nodes_dir = Path::new(&config.app_path).join("custom_nodes");
    std::fs::create_dir_all(&custom_nodes_dir)?;

    for node in nodes {
        if node.venv_version != "*" && node.venv_version != chosen_version {
            continue;
        }

        match install_one_node(&config.id, &config.venv_path, &custom_nodes_dir, node, bus) {
            Ok(()) => summary.installed.push(node.name.clone()),
            Err(e) => summary.failed.push((node.name.clone(), e.to_string())),
        }
    }

    run_template(&config.bash_cmds, "install-comfy-CLI", &config.venv_path, &config.app_path, None)?;
    run_template(&config.bash_cmds, "pip-clean-up", &config.venv_path, &config.app_path, None)?;

    Ok(summary)
}

fn install_one_node(
    app_id: &str,
    venv_path: &str,
    custom_nodes_dir: &Path,
    node: &CustomNode,
    bus: &ProgressBus,
) -> AppResult<()> {
    let node_path = custom_nodes_dir.join(&node.path);

    if node_path.exists() {
        return Ok(());
    }

    bus.publish(BusEvent::InstallLog {
        app_id: app_id.to_string(),
        log: format!("Cloning '{}' ...", node.name),
    });

    if node.clone_recursive {
        clone_recursive(&node.repo_url, &node_path)?;
    } else {
        Repository::clone(&node.repo_url, &node_path)?;
    }

    bus.publish(BusEvent::InstallLog {
        app_id: app_id.to_string(),
        log: format!("'{}' cloned successfully.", node.name),
    });

    if node.install_requirements_txt && node_path.join("requirements.txt").exists() {
        install_requirements(venv_path, &node_path)?;
    }

    Ok(())
}

fn install_requirements(venv_path: &str, node_path: &Path) -> AppResult<()> {
    let command = format!(
        "source {venv_path}/bin/activate && cd {} && pip install -r requirements.txt",
        node_path.display()
    );
    let output = std::process::Command::new("/bin/bash")
        .arg("-c")
        .arg(&command)
        .output()
        .map_err(|e| crate::error::AppError::SubprocessFailed {
            code: None,
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(crate::error::AppError::SubprocessFailed {
            code: output.status.code(),
            message: format!(
                "pip install failed for '{}': {}",
                node_path.display(),
                String::from_utf8_lossy(&output.stderr)
            ),
        });
    }

    Ok(())
}

fn clone_recursive(repo_url: &str, dest: &Path) -> AppResult<()> {
    let repo = Repository::clone(repo_url, dest)?;
    for mut submodule in repo.submodules()? {
        submodule.update(true, None)?;
    }
    Ok(())
}
