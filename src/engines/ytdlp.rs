use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::engines::{drain_stderr, last_diagnostic, AudioStreamer};
use crate::error::TrackError;
use crate::models::SourceLocator;

/// Runs `yt-dlp` with the best audio-only format and pipes its stdout into the
/// destination file.
pub struct YtDlp {
    program: String,
}

impl YtDlp {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(url: &str) -> Vec<&str> {
        vec![
            "--quiet",
            "--no-warnings",
            "--no-playlist",
            "--no-part",
            "-f",
            "bestaudio",
            "-o",
            "-",
            url,
        ]
    }
}

#[async_trait]
impl AudioStreamer for YtDlp {
    async fn stream_to(&self, locator: &SourceLocator, dest: &Path) -> Result<u64, TrackError> {
        let url = locator.url();
        tracing::debug!("{} streaming {} -> {}", self.program, url, dest.display());

        let mut child = Command::new(&self.program)
            .args(Self::args(&url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TrackError::Fetch(format!("could not start {}: {}", self.program, e)))?;

        let stderr = drain_stderr(&mut child);

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| TrackError::Fetch("no stdout from downloader".to_string()))?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| TrackError::Fetch(format!("{}: {}", dest.display(), e)))?;

        let copied = tokio::io::copy(&mut stdout, &mut file).await;
        let flushed = file.flush().await;
        // closing our end lets a stalled writer exit on SIGPIPE
        drop(stdout);

        let status = child
            .wait()
            .await
            .map_err(|e| TrackError::Fetch(e.to_string()))?;
        let stderr = stderr.await.unwrap_or_default();

        if !status.success() {
            let detail = last_diagnostic(&stderr)
                .unwrap_or_else(|| format!("{} exited with {}", self.program, status));
            return Err(TrackError::Fetch(detail));
        }

        let written = copied.map_err(|e| TrackError::Fetch(format!("stream interrupted: {}", e)))?;
        flushed.map_err(|e| TrackError::Fetch(format!("{}: {}", dest.display(), e)))?;
        Ok(written)
    }
}
