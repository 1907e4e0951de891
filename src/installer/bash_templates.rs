// src/installer/bash_templates.rs
// Named shell-command templates carried per AppConfig (`bash_cmds`), run
// inside the activated VENV. `{app_path}` / `{venv_path}` / `{node_path}`
// placeholders are substituted before execution.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{AppError, AppResult};

pub fn run_template(
    templates: &HashMap<String, String>,
    name: &str,
    venv_path: &str,
    app_path: &str,
    node_path: Option<&Path>,
) -> AppResult<Option<String>> {
    let Some(raw) = templates.get(name) else {
        return Ok(None);
    };

    let mut command = raw
        .replace("{venv_path}", venv_path)
        .replace("{app_path}", app_path);
    if let Some(node_path) = node_path {
        command = command.replace("{node_path}", &node_path.display().to_string());
    }

    let activated = format!("source {venv_path}/bin/activate && {command}");

    let output = std::process::Command::new("/bin/bash")
        .arg("-c")
        .arg(&activated)
        .output()
        .map_err(|e| AppError::SubprocessFailed {
            code: None,
            message: format!("failed to run bash template '{name}': {e}"),
        })?;

    if !output.status.success() {
        return Err(AppError::SubprocessFailed {
            code: output.status.code(),
            message: format!(
                "bash template '{name}' exited non-zero: {}",
                String::from_utf8_lossy(&output.stderr)
            ),
        });
    }

    Ok(Some(String::from_utf8_lossy(&output.stdout).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_template_is_a_noop() {
        let templates = HashMap::new();
        let result = run_template(&templates, "install-comfy-CLI", "/workspace/bcomfy", "/workspace/ComfyUI", None).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn substitutes_placeholders() {
        let mut templates = HashMap::new();
        templates.insert("echo-paths".to_string(), "echo {app_path} {venv_path}".to_string());
        let result = run_template(&templates, "echo-paths", "/workspace/bcomfy", "/workspace/ComfyUI", None).unwrap();
        assert!(result.unwrap().contains("/workspace/ComfyUI"));
    }
}
