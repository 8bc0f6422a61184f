use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::naming;
use crate::engines::AudioStreamer;
use crate::error::TrackError;
use crate::models::SourceLocator;

/// Result of the fetch stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Audio was streamed to this staging path.
    Staged(PathBuf),
    /// The final file for this stem already exists. Nothing was fetched.
    AlreadyMaterialized(PathBuf),
}

pub struct Fetcher {
    streamer: Arc<dyn AudioStreamer>,
}

impl Fetcher {
    pub fn new(streamer: Arc<dyn AudioStreamer>) -> Self {
        Self { streamer }
    }

    /// Streams the source into `stem` unless `stem.mp3` is already on disk.
    pub async fn fetch(
        &self,
        locator: &SourceLocator,
        stem: &Path,
    ) -> Result<FetchResult, TrackError> {
        let final_path = naming::final_path(stem);
        match tokio::fs::try_exists(&final_path).await {
            Ok(true) => {
                tracing::debug!("{} exists, not fetching", final_path.display());
                return Ok(FetchResult::AlreadyMaterialized(final_path));
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("cannot check {}: {}", final_path.display(), e);
                return Err(TrackError::Fetch(format!("{}: {}", final_path.display(), e)));
            }
        }

        let staged = stem.to_path_buf();
        let result = match self.streamer.stream_to(locator, &staged).await {
            Ok(0) => Err(TrackError::Fetch(format!(
                "empty stream from {}",
                locator.url()
            ))),
            other => other,
        };

        match result {
            Ok(bytes) => {
                tracing::debug!("staged {} bytes at {}", bytes, staged.display());
                Ok(FetchResult::Staged(staged))
            }
            Err(e) => {
                discard_partial(&staged).await;
                Err(e)
            }
        }
    }
}

async fn discard_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!("removed partial download {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("could not remove {}: {}", path.display(), e),
    }
}
