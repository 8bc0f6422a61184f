use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::naming::{self, TARGET_FORMAT};
use crate::engines::TranscodeEngine;
use crate::error::TrackError;

/// A converted file at its final path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodedFile {
    pub path: PathBuf,
    pub output_bytes: u64,
}

pub struct Transcoder {
    engine: Arc<dyn TranscodeEngine>,
}

impl Transcoder {
    pub fn new(engine: Arc<dyn TranscodeEngine>) -> Self {
        Self { engine }
    }

    /// Converts `staged` into `staged.mp3`. The staged file is left in place.
    /// On failure any partial output is removed, so a broken file is never
    /// mistaken for a finished one on the next run.
    pub async fn transcode(&self, staged: &Path) -> Result<TranscodedFile, TrackError> {
        let output = naming::final_path(staged);
        match self.engine.convert(staged, &output, TARGET_FORMAT).await {
            Ok(stats) => Ok(TranscodedFile {
                path: output,
                output_bytes: stats.output_bytes,
            }),
            Err(e) => {
                discard_output(&output).await;
                Err(e)
            }
        }
    }

    /// Best-effort removal of the staged source. Failures are only logged.
    pub async fn remove_source(&self, staged: &Path) {
        match tokio::fs::remove_file(staged).await {
            Ok(()) => tracing::debug!("removed source file {}", staged.display()),
            Err(e) => tracing::warn!("could not remove source file {}: {}", staged.display(), e),
        }
    }
}

async fn discard_output(output: &Path) {
    match tokio::fs::remove_file(output).await {
        Ok(()) => tracing::debug!("removed partial output {}", output.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("could not remove partial output {}: {}", output.display(), e),
    }
}
