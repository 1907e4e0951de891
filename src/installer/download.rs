// src/installer/download.rs
// Download stage: a parallel multi-connection downloader (aria2c) when
// present on PATH, otherwise a direct streaming reqwest GET. Both paths
// feed the same install_progress events.

use std::path::{Path, PathBuf};
use std::time::Instant;

use futures_util::StreamExt;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::bus::{BusEvent, ProgressBus};
use crate::error::{AppError, AppResult};
use crate::util::sizefmt::human_bytes;

static ARIA2_AVAILABLE: Lazy<bool> = Lazy::new(|| which_aria2c().is_some());

fn which_aria2c() -> Option<PathBuf> {
    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join("aria2c"))
            .find(|candidate| candidate.is_file())
    })
}

/// `[#<gid> <done>/<total>(<pct>%) CN:<n> DL:<rate> ETA:<hhms>]`
static ARIA2_PROGRESS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\[#(\w+)\s+[\d.]+[GMK]iB/[\d.]+[GMK]iB\((\d+)%\)\s+CN:(\d+)\s+DL:([\d.]+[GMK]iB)\s+ETA:([\dhms]+)\]",
    )
    .unwrap()
});

pub struct DownloadOutcome {
    pub archive_path: PathBuf,
}

/// Downloads `download_url` into `dest_dir`, basename taken from the URL.
/// If the archive already exists, the stage is skipped entirely (the
/// spec's "archive already exists -> skip to Verify" shortcut).
pub async fn download(
    app_id: &str,
    download_url: &str,
    dest_dir: &Path,
    bus: &ProgressBus,
) -> AppResult<DownloadOutcome> {
    let filename = download_url
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::PreconditionFailed(format!("cannot derive filename from '{download_url}'")))?;
    let archive_path = dest_dir.join(filename);

    if archive_path.exists() {
        bus.publish(BusEvent::InstallLog {
            app_id: app_id.to_string(),
            log: format!("using cached archive '{}'", archive_path.display()),
        });
        return Ok(DownloadOutcome { archive_path });
    }

    if *ARIA2_AVAILABLE {
        download_with_aria2c(app_id, download_url, dest_dir, &archive_path, bus).await?;
    } else {
        download_with_reqwest(app_id, download_url, &archive_path, bus).await?;
    }

    if !archive_path.exists() {
        return Err(AppError::NetworkError(format!(
            "download reported success but '{}' is missing",
            archive_path.display()
        )));
    }

    bus.publish(BusEvent::InstallProgress {
        app_id: app_id.to_string(),
        percentage: 100,
        stage: "Downloading".to_string(),
        speed: None,
        eta: None,
        downloaded: None,
        processed: None,
    });

    Ok(DownloadOutcome { archive_path })
}

async fn download_with_aria2c(
    app_id: &str,
    download_url: &str,
    dest_dir: &Path,
    archive_path: &Path,
    bus: &ProgressBus,
) -> AppResult<()> {
    let mut child = Command::new("aria2c")
        .arg("--max-connection-per-server=16")
        .arg("--max-concurrent-downloads=16")
        .arg("--split=16")
        .arg("--summary-interval=1")
        .arg(download_url)
        .arg(format!("--dir={}", dest_dir.display()))
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .map_err(|e| AppError::SubprocessFailed {
            code: None,
            message: format!("failed to launch aria2c: {e}"),
        })?;

    let stdout = child.stdout.take().expect("piped stdout");
    let mut lines = tokio::io::AsyncBufReadExt::lines(tokio::io::BufReader::new(stdout));

    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(progress) = parse_aria2_progress_line(&line) {
            bus.publish(BusEvent::InstallProgress {
                app_id: app_id.to_string(),
                percentage: progress.percentage,
                stage: "Downloading".to_string(),
                speed: Some(progress.speed),
                eta: Some(progress.eta),
                downloaded: None,
                processed: None,
            });
        }
    }

    let status = child.wait().await.map_err(|e| AppError::SubprocessFailed {
        code: None,
        message: e.to_string(),
    })?;

    if !status.success() {
        return Err(AppError::SubprocessFailed {
            code: status.code(),
            message: format!("aria2c exited with status {status}"),
        });
    }

    let _ = archive_path;
    Ok(())
}

pub struct Aria2Progress {
    pub percentage: u32,
    pub speed: String,
    pub eta: String,
}

pub fn parse_aria2_progress_line(line: &str) -> Option<Aria2Progress> {
    let captures = ARIA2_PROGRESS_LINE.captures(line)?;
    Some(Aria2Progress {
        percentage: captures[2].parse().ok()?,
        speed: format!("{}/s", &captures[4]),
        eta: captures[5].to_string(),
    })
}

async fn download_with_reqwest(
    app_id: &str,
    download_url: &str,
    archive_path: &Path,
    bus: &ProgressBus,
) -> AppResult<()> {
    let client = reqwest::Client::new();
    let response = client.get(download_url).send().await?.error_for_status()?;
    let total_bytes = response.content_length();

    let mut file = tokio::fs::File::create(archive_path).await?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let start = Instant::now();
    let mut last_emit = Instant::now();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(AppError::from)?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if last_emit.elapsed().as_millis() >= 500 {
            last_emit = Instant::now();
            let elapsed_secs = start.elapsed().as_secs_f64().max(0.001);
            let speed_bps = downloaded as f64 / elapsed_secs;
            let percentage = total_bytes
                .map(|total| ((downloaded as f64 / total as f64) * 100.0).min(100.0) as u32)
                .unwrap_or(0);
            let eta = total_bytes
                .map(|total| {
                    let remaining = total.saturating_sub(downloaded) as f64;
                    format!("{}s", (remaining / speed_bps.max(1.0)) as u64)
                })
                .unwrap_or_else(|| "unknown".to_string());

            bus.publish(BusEvent::InstallProgress {
                app_id: app_id.to_string(),
                percentage,
                stage: "Downloading".to_string(),
                speed: Some(format!("{}/s", human_bytes(speed_bps as u64))),
                eta: Some(eta),
                downloaded: Some(human_bytes(downloaded)),
                processed: None,
            });
        }
    }

    file.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aria2_progress_line() {
        let line = "[#cd57da 2.1GiB/4.0GiB(53%) CN:16 DL:1.9MiB ETA:16m19s]";
        let progress = parse_aria2_progress_line(line).unwrap();
        assert_eq!(progress.percentage, 53);
        assert_eq!(progress.speed, "1.9MiB/s");
        assert_eq!(progress.eta, "16m19s");
    }

    #[test]
    fn ignores_unrelated_lines() {
        assert!(parse_aria2_progress_line("Download Results:").is_none());
    }
}
