use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::engines::{drain_stderr, last_diagnostic, TranscodeEngine, TranscodeStats};
use crate::error::TrackError;

/// Runs `ffmpeg` and follows its machine-readable `-progress` output.
pub struct Ffmpeg {
    program: String,
}

impl Ffmpeg {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args<'a>(input: &'a Path, output: &'a Path, format: &'a str) -> Vec<&'a OsStr> {
        let mut args: Vec<&OsStr> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-y", "-i"]
            .into_iter()
            .map(OsStr::new)
            .collect();
        args.push(input.as_os_str());
        args.extend(
            ["-vn", "-f", format, "-progress", "pipe:1", "-nostats"]
                .into_iter()
                .map(OsStr::new),
        );
        args.push(output.as_os_str());
        args
    }
}

/// Pulls `total_size=<bytes>` out of one `-progress` line.
fn parse_total_size(line: &str) -> Option<u64> {
    line.trim().strip_prefix("total_size=")?.parse().ok()
}

#[async_trait]
impl TranscodeEngine for Ffmpeg {
    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        format: &str,
    ) -> Result<TranscodeStats, TrackError> {
        tracing::debug!(
            "{} converting {} -> {} ({})",
            self.program,
            input.display(),
            output.display(),
            format
        );

        let mut child = Command::new(&self.program)
            .args(Self::args(input, output, format))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TrackError::Transcode(format!("could not start {}: {}", self.program, e))
            })?;

        let stderr = drain_stderr(&mut child);

        let mut stats = TranscodeStats::default();
        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(size) = parse_total_size(&line) {
                    stats.output_bytes = size;
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| TrackError::Transcode(e.to_string()))?;
        let stderr = stderr.await.unwrap_or_default();

        if !status.success() {
            let detail = last_diagnostic(&stderr)
                .unwrap_or_else(|| format!("{} exited with {}", self.program, status));
            return Err(TrackError::Transcode(detail));
        }

        if stats.output_bytes == 0 {
            if let Ok(meta) = tokio::fs::metadata(output).await {
                stats.output_bytes = meta.len();
            }
        }
        Ok(stats)
    }
}
