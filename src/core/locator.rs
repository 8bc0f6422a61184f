use std::sync::Arc;

use crate::error::TrackError;
use crate::models::{SourceLocator, TrackDescriptor};
use crate::sources::SearchApi;

/// Extra search term that steers results toward audio-only uploads.
const DISAMBIGUATION: &str = "audio";

/// Finds one playable source per track. A single query, no retries.
pub struct Locator {
    search: Arc<dyn SearchApi>,
}

impl Locator {
    pub fn new(search: Arc<dyn SearchApi>) -> Self {
        Self { search }
    }

    pub async fn locate(&self, track: &TrackDescriptor) -> Result<SourceLocator, TrackError> {
        let query = build_search_query(track);
        tracing::debug!("searching for \"{}\"", query);

        let results = self.search.search(&query, 1).await?;
        results
            .into_iter()
            .next()
            .ok_or(TrackError::NoMatchFound { query })
    }
}

/// `"{artist} {title} audio"`
pub fn build_search_query(track: &TrackDescriptor) -> String {
    format!(
        "{} {} {}",
        track.artist_name, track.track_title, DISAMBIGUATION
    )
}
