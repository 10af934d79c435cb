use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::bounded::bounded;
use crate::error::{Error, Result};

/// Fetches an installer package
#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    /// Write the body at `url` to `destination`, returning the byte count
    async fn download(&self, url: &str, destination: &Path) -> Result<u64>;
}

/// Runs an installer package without user interaction
#[async_trait::async_trait]
pub trait Installer: Send + Sync {
    /// Install into `target_dir` and return the installer's exit code.
    ///
    /// Must give up with `Timeout` after `limit` or `Cancelled` once `cancel`
    /// fires, and must not return before the installer process has exited:
    /// the caller deletes the package right afterwards.
    async fn install(
        &self,
        installer: &Path,
        target_dir: &Path,
        limit: Duration,
        cancel: &CancellationToken,
    ) -> Result<i32>;
}

pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, destination: &Path) -> Result<u64> {
        let failed = |reason: String| Error::DownloadFailed {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let mut file = tokio::fs::File::create(destination).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| failed(e.to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}

/// Inno Setup style installer: `<installer> /SILENT /DIR=<target>`
pub struct SilentInstaller;

impl SilentInstaller {
    pub fn arguments(target_dir: &Path) -> [String; 2] {
        ["/SILENT".to_string(), format!("/DIR={}", target_dir.display())]
    }
}

#[async_trait::async_trait]
impl Installer for SilentInstaller {
    async fn install(
        &self,
        installer: &Path,
        target_dir: &Path,
        limit: Duration,
        cancel: &CancellationToken,
    ) -> Result<i32> {
        let mut child = Command::new(installer)
            .args(Self::arguments(target_dir))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::InstallFailed(format!("could not start installer: {e}")))?;

        let waited = bounded("install", limit, cancel, async {
            Ok::<_, Error>(child.wait().await?)
        })
        .await;

        match waited {
            // Killed by a signal: no code, treat as failure
            Ok(status) => Ok(status.code().unwrap_or(-1)),
            Err(e) => {
                // The package stays locked on Windows until its process is gone
                if let Err(kill) = child.kill().await {
                    tracing::warn!("Failed to stop installer: {}", kill);
                }
                Err(e)
            }
        }
    }
}
