// src/installer/post_setup.rs
// App-specific patches and the optional local-venv compatibility symlink.
// Grounded on `update_kohya_setup_sh()` / `ensure_kohya_local_venv_is_symlinked()`-
// style helpers in the original source, generalized via AppKind instead
// of special-casing one app id.

use std::os::unix::fs::symlink;
use std::path::Path;

use crate::bus::{BusEvent, ProgressBus};
use crate::config::AppConfig;
use crate::error::AppResult;

/// Substitutes the resolved branch name into the app's `setup.sh`, for
/// apps whose upstream script hardcodes a stale branch token.
pub fn patch_setup_script(config: &AppConfig, branch_name: &str, bus: &ProgressBus) -> AppResult<()> {
    if !config.kind.needs_setup_script_patch {
        return Ok(());
    }

    let setup_script = Path::new(&config.app_path).join("setup.sh");
    if !setup_script.exists() {
        bus.publish(BusEvent::InstallLog {
            app_id: config.id.clone(),
            log: "setup.sh not found, skipping branch patch".to_string(),
        });
        return Ok(());
    }

    let content = std::fs::read_to_string(&setup_script)?;
    let patched = content.replace("BRANCH=\"master\"", &format!("BRANCH=\"{branch_name}\""));
    if patched != content {
        std::fs::write(&setup_script, patched)?;
        bus.publish(BusEvent::InstallLog {
            app_id: config.id.clone(),
            log: format!("patched setup.sh branch token to '{branch_name}'"),
        });
    }

    Ok(())
}

/// Symlinks a subfolder of the app path to the VENV path, for apps that
/// expect their VENV inline rather than activated externally.
pub fn ensure_local_venv_symlink(config: &AppConfig, bus: &ProgressBus) -> AppResult<()> {
    if !config.kind.needs_local_venv_symlink {
        return Ok(());
    }

    let link_path = Path::new(&config.app_path).join("venv");
    if link_path.exists() {
        return Ok(());
    }

    symlink(&config.venv_path, &link_path)?;
    bus.publish(BusEvent::InstallLog {
        app_id: config.id.clone(),
        log: format!("linked '{}' -> '{}'", link_path.display(), config.venv_path),
    });

    Ok(())
}
