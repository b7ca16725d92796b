/// Video title resolution through yt-dlp
use async_trait::async_trait;
use linkdrop_core::{LinkdropError, Result, TitleResolver};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct YtDlpTitleResolver {
    ytdlp_path: PathBuf,
    timeout: Duration,
}

impl YtDlpTitleResolver {
    pub fn new(ytdlp_path: PathBuf, timeout: Duration) -> Self {
        Self {
            ytdlp_path,
            timeout,
        }
    }

    /// Check that the tool can be started at all
    pub async fn check_available(&self) -> Result<String> {
        let output = Command::new(&self.ytdlp_path)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                LinkdropError::TitleResolution(format!(
                    "cannot run {}: {}",
                    self.ytdlp_path.display(),
                    e
                ))
            })?;

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl TitleResolver for YtDlpTitleResolver {
    async fn resolve_title(&self, url: &str) -> Result<Option<String>> {
        let mut cmd = Command::new(&self.ytdlp_path);
        cmd.arg("--skip-download")
            .arg("--no-warnings")
            .arg("--no-playlist")
            .arg("--print")
            .arg("title")
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(output) => output.map_err(|e| {
                LinkdropError::TitleResolution(format!(
                    "cannot run {}: {}",
                    self.ytdlp_path.display(),
                    e
                ))
            })?,
            Err(_) => {
                warn!(url = %url, timeout_secs = self.timeout.as_secs(), "Title lookup timed out");
                return Ok(None);
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!(url = %url, status = ?output.status.code(), stderr = %stderr.trim(), "Title lookup failed");
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let title = stdout.lines().next().unwrap_or_default().trim();
        if title.is_empty() {
            return Ok(None);
        }

        debug!(url = %url, title = %title, "Resolved video title");
        Ok(Some(title.to_string()))
    }
}
