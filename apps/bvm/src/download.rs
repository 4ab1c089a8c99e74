//! Streaming artifact downloads.
//!
//! The body is streamed into `<dest>.tmp` and renamed to `dest` only once the
//! whole artifact has arrived, so an interrupted download never leaves a
//! truncated archive behind. Progress is a single carriage-return-updated line
//! on stderr.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::catalog::CatalogClient;

/// Minimum interval between progress updates in milliseconds.
const PROGRESS_INTERVAL_MS: u128 = 250;

/// Downloads `url` to `dest`.
///
/// # Errors
///
/// Returns an error if the request fails, the server answers with a
/// non-success status, or the file cannot be written.
pub async fn download_file(
    client: &CatalogClient,
    url: &str,
    dest: &Path,
    show_progress: bool,
) -> Result<()> {
    let temp_path = temp_path_for(dest);

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    if let Err(e) = stream_to_file(client, url, &temp_path, show_progress).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(&temp_path, dest).await.with_context(|| {
        format!(
            "Failed to rename {} to {}",
            temp_path.display(),
            dest.display()
        )
    })
}

/// `bun-linux-x64.zip` downloads through `bun-linux-x64.zip.tmp`.
fn temp_path_for(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

async fn stream_to_file(
    client: &CatalogClient,
    url: &str,
    dest: &Path,
    show_progress: bool,
) -> Result<()> {
    let response = client.get(url).await?;
    let total_size = response.content_length().unwrap_or(0);

    let mut file = tokio::fs::File::create(dest)
        .await
        .with_context(|| format!("Failed to create file: {}", dest.display()))?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let start_time = Instant::now();
    let mut last_update = Instant::now();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.with_context(|| format!("Failed to read chunk from {url}"))?;
        file.write_all(&chunk)
            .await
            .with_context(|| format!("Failed to write to {}", dest.display()))?;
        downloaded += chunk.len() as u64;

        let now = Instant::now();
        if show_progress && now.duration_since(last_update).as_millis() >= PROGRESS_INTERVAL_MS {
            print_progress(downloaded, total_size, start_time.elapsed().as_secs_f64());
            last_update = now;
        }
    }

    file.flush()
        .await
        .with_context(|| format!("Failed to flush {}", dest.display()))?;

    if show_progress {
        print_progress(downloaded, total_size, start_time.elapsed().as_secs_f64());
        eprintln!();
    }

    Ok(())
}

#[allow(clippy::cast_precision_loss)]
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::cast_sign_loss)]
fn print_progress(downloaded: u64, total: u64, elapsed_secs: f64) {
    let speed = if elapsed_secs > 0.0 {
        downloaded as f64 / elapsed_secs
    } else {
        0.0
    };

    let line = if total > 0 {
        let percent = (downloaded as f64 / total as f64 * 100.0).min(100.0) as u8;
        format!(
            "{}/{} ({percent}%) {}",
            format_bytes(downloaded),
            format_bytes(total),
            format_speed(speed)
        )
    } else {
        format!("{} {}", format_bytes(downloaded), format_speed(speed))
    };

    let mut stderr = std::io::stderr();
    let _ = write!(stderr, "\r{line}     ");
    let _ = stderr.flush();
}

/// Formats bytes into a human-readable string (KB, MB, GB).
fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    #[allow(clippy::cast_precision_loss)]
    let bytes_f = bytes as f64;

    if bytes_f >= GB {
        format!("{:.2} GB", bytes_f / GB)
    } else if bytes_f >= MB {
        format!("{:.2} MB", bytes_f / MB)
    } else if bytes_f >= KB {
        format!("{:.2} KB", bytes_f / KB)
    } else {
        format!("{bytes} B")
    }
}

/// Formats speed (bytes/sec) into a human-readable string.
fn format_speed(speed: f64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    if speed >= MB {
        format!("{:.2} MB/s", speed / MB)
    } else if speed >= KB {
        format!("{:.2} KB/s", speed / KB)
    } else {
        format!("{speed:.0} B/s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BvmError;
    use assert_fs::TempDir;
    use mockito::Server;

    #[tokio::test]
    async fn download_file_writes_body_and_removes_temp() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/bun-linux-x64.zip")
            .with_status(200)
            .with_body(vec![7u8; 4096])
            .create_async()
            .await;
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("downloads").join("bun-linux-x64.zip");
        let client = CatalogClient::with_base_url(None, &server.url()).unwrap();

        download_file(
            &client,
            &format!("{}/bun-linux-x64.zip", server.url()),
            &dest,
            false,
        )
        .await
        .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), vec![7u8; 4096]);
        assert!(!temp_path_for(&dest).exists());
    }

    #[tokio::test]
    async fn download_file_fails_on_missing_artifact() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/missing.zip")
            .with_status(404)
            .create_async()
            .await;
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("missing.zip");
        let client = CatalogClient::with_base_url(None, &server.url()).unwrap();

        let err = download_file(&client, &format!("{}/missing.zip", server.url()), &dest, false)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BvmError>(),
            Some(BvmError::HttpStatus { status: 404, .. })
        ));
        assert!(!dest.exists());
        assert!(!temp_path_for(&dest).exists());
    }

    #[test]
    fn temp_path_appends_suffix() {
        assert_eq!(
            temp_path_for(Path::new("/d/node-v20.11.0-linux-x64.tar.gz")),
            PathBuf::from("/d/node-v20.11.0-linux-x64.tar.gz.tmp")
        );
    }

    #[test]
    fn format_bytes_picks_unit() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn format_speed_picks_unit() {
        assert_eq!(format_speed(100.0), "100 B/s");
        assert_eq!(format_speed(1536.0), "1.50 KB/s");
        assert_eq!(format_speed(2.0 * 1024.0 * 1024.0), "2.00 MB/s");
    }
}
