//! External programs that move and convert media bytes.

pub mod ffmpeg;
pub mod ytdlp;

use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Child;
use tokio::task::JoinHandle;

use crate::error::TrackError;
use crate::models::SourceLocator;

/// Streams audio-only content for a source into a local file.
#[async_trait]
pub trait AudioStreamer: Send + Sync {
    /// Writes the full stream to `dest` and returns the number of bytes
    /// written. Only returns once the stream has ended.
    async fn stream_to(&self, locator: &SourceLocator, dest: &Path) -> Result<u64, TrackError>;
}

/// Final size reported by a finished conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TranscodeStats {
    pub output_bytes: u64,
}

/// Converts one local media file into another container/codec.
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        format: &str,
    ) -> Result<TranscodeStats, TrackError>;
}

/// Last non-empty line of a tool's stderr, which is where both tools put the
/// actual error.
pub(crate) fn last_diagnostic(stderr: &[u8]) -> Option<String> {
    String::from_utf8_lossy(stderr)
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .map(str::to_string)
}

/// Reads the child's stderr to the end on its own task, so a chatty tool can
/// never block on a full pipe while stdout is being consumed.
pub(crate) fn drain_stderr(child: &mut Child) -> JoinHandle<Vec<u8>> {
    let stderr = child.stderr.take();
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut stderr) = stderr {
            if let Err(e) = stderr.read_to_end(&mut buf).await {
                tracing::debug!("stderr read ended early: {}", e);
            }
        }
        buf
    })
}
