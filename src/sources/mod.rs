pub mod artwork;
pub mod spotify;
pub mod youtube;

use async_trait::async_trait;

use crate::error::{CatalogError, TrackError};
use crate::models::{CatalogAlbum, CatalogPlaylist, CatalogTrack, SourceLocator};

/// Music catalog metadata provider.
/// Implementations hold an already-authenticated session.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn get_track(&self, id: &str) -> Result<CatalogTrack, CatalogError>;
    async fn get_album(&self, id: &str) -> Result<CatalogAlbum, CatalogError>;
    /// Returns the playlist with every member, across all result pages.
    async fn get_playlist(&self, id: &str) -> Result<CatalogPlaylist, CatalogError>;
}

/// Text search over playable media sources.
#[async_trait]
pub trait SearchApi: Send + Sync {
    /// Returns up to `limit` results, best match first.
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SourceLocator>, TrackError>;
}

/// Downloads cover art images.
#[async_trait]
pub trait ArtworkApi: Send + Sync {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, CatalogError>;
}
