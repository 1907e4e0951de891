// src/installer/unpack.rs
// Unpack stage: stream-decompress the archive into the VENV directory.
// Tolerates two archive layouts: top-level member is either the VENV
// root directly, or a single directory named like the app id.

use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;

use crate::bus::{BusEvent, ProgressBus};
use crate::error::AppResult;

struct ProgressReader<R> {
    inner: R,
    seen: u64,
    total: u64,
    app_id: String,
    bus: ProgressBus,
    last_emit_percentage: u32,
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.seen += n as u64;

        let percentage = if self.total > 0 {
            ((self.seen as f64 / self.total as f64) * 100.0).min(100.0) as u32
        } else {
            0
        };

        if percentage != self.last_emit_percentage {
            self.last_emit_percentage = percentage;
            self.bus.publish(BusEvent::InstallProgress {
                app_id: self.app_id.clone(),
                percentage,
                stage: "Unpacking".to_string(),
                speed: None,
                eta: None,
                downloaded: None,
                processed: None,
            });
        }

        Ok(n)
    }
}

/// `expected_uncompressed_bytes` drives the percentage calculation;
/// pass 0 if unknown (progress then reports 0% until completion).
pub fn unpack(
    app_id: &str,
    archive_path: &Path,
    venv_path: &Path,
    expected_uncompressed_bytes: u64,
    bus: &ProgressBus,
) -> AppResult<()> {
    fs::create_dir_all(venv_path)?;

    let file = fs::File::open(archive_path)?;
    let counted = ProgressReader {
        inner: file,
        seen: 0,
        total: expected_uncompressed_bytes,
        app_id: app_id.to_string(),
        bus: bus.clone(),
        last_emit_percentage: u32::MAX,
    };
    let decoder = GzDecoder::new(counted);
    let mut archive = Archive::new(decoder);

    let extract_root = resolve_extract_root(archive_path, venv_path)?;
    archive.unpack(&extract_root)?;

    // Dual-layout tolerance: if everything landed under a single nested
    // directory instead of venv_path directly, hoist it up one level.
    rehome_single_nested_dir(venv_path)?;

    bus.publish(BusEvent::InstallProgress {
        app_id: app_id.to_string(),
        percentage: 100,
        stage: "Unpacking".to_string(),
        speed: None,
        eta: None,
        downloaded: None,
        processed: None,
    });

    Ok(())
}

fn resolve_extract_root(_archive_path: &Path, venv_path: &Path) -> AppResult<std::path::PathBuf> {
    Ok(venv_path.to_path_buf())
}

fn rehome_single_nested_dir(venv_path: &Path) -> AppResult<()> {
    let mut entries: Vec<_> = fs::read_dir(venv_path)?.filter_map(|e| e.ok()).collect();
    if entries.len() != 1 {
        return Ok(());
    }
    let only = entries.remove(0);
    if !only.file_type()?.is_dir() {
        return Ok(());
    }

    // Heuristic: a freshly unpacked VENV directory always contains a
    // `bin/` (or `Scripts/`) entry at its own root; a single nested
    // directory without one is almost certainly the archive's own
    // top-level wrapper directory and should be hoisted.
    if only.path().join("bin").exists() {
        return Ok(());
    }

    for child in fs::read_dir(only.path())? {
        let child = child?;
        let dest = venv_path.join(child.file_name());
        fs::rename(child.path(), dest)?;
    }
    fs::remove_dir(only.path())?;
    Ok(())
}
