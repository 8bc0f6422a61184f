use std::sync::Arc;

use crate::error::{CatalogError, Error};
use crate::models::{CatalogImage, ReleaseDate, TrackDescriptor, UNKNOWN};
use crate::sources::CatalogApi;

/// Turns catalog ids into normalized track descriptors.
pub struct Resolver {
    catalog: Arc<dyn CatalogApi>,
}

impl Resolver {
    pub fn new(catalog: Arc<dyn CatalogApi>) -> Self {
        Self { catalog }
    }

    /// Fetches a track and its album and merges them into a descriptor.
    pub async fn resolve_track(&self, track_id: &str) -> Result<TrackDescriptor, CatalogError> {
        let track = self.catalog.get_track(track_id).await?;
        let album = self.catalog.get_album(&track.album_id).await?;

        let title = track.name.trim();
        if title.is_empty() {
            return Err(CatalogError::Malformed(format!("track {} has no title", track.id)));
        }
        let artist_name = track
            .artists
            .iter()
            .map(|a| a.trim())
            .find(|a| !a.is_empty())
            .ok_or_else(|| CatalogError::Malformed(format!("track {} has no artist", track.id)))?
            .to_string();

        let release_date = track.release_date.as_deref().and_then(ReleaseDate::parse);
        if release_date.is_none() {
            tracing::warn!(
                "track {} has unusable release date {:?}, year will be left blank",
                track.id,
                track.release_date
            );
        }

        let genre = first_non_empty(&album.genres).unwrap_or_else(|| UNKNOWN.to_string());
        let album_artist_name =
            first_non_empty(&album.artists).unwrap_or_else(|| artist_name.clone());
        let album_name = match track.album_name.trim() {
            "" => UNKNOWN.to_string(),
            name => name.to_string(),
        };

        Ok(TrackDescriptor {
            id: track.id.clone(),
            artist_name,
            track_title: title.to_string(),
            album_name,
            album_artist_name,
            track_number: track.track_number.max(1),
            release_date,
            genre,
            cover_art_url: pick_cover_art(&track.album_images).map(|img| img.url.clone()),
            all_artists: track.artists,
            isrc: track.isrc,
        })
    }

    /// Resolves every member of a public playlist, in listed order.
    ///
    /// Visibility is checked before any member is touched. Removed or local
    /// entries, and members the catalog no longer serves, are skipped.
    pub async fn resolve_collection(
        &self,
        collection_id: &str,
    ) -> Result<Vec<TrackDescriptor>, Error> {
        let playlist = self.catalog.get_playlist(collection_id).await?;

        if playlist.public != Some(true) {
            return Err(Error::PrivateCollection(playlist.id));
        }

        tracing::info!(
            "resolving playlist '{}' ({} entries)",
            playlist.name,
            playlist.track_ids.len()
        );

        let mut tracks = Vec::with_capacity(playlist.track_ids.len());
        for (position, entry) in playlist.track_ids.iter().enumerate() {
            let Some(track_id) = entry else {
                tracing::warn!("playlist entry {} has no track, skipping", position + 1);
                continue;
            };
            match self.resolve_track(track_id).await {
                Ok(track) => tracks.push(track),
                Err(e) if e.is_member_skippable() => {
                    tracing::warn!("skipping playlist entry {}: {}", position + 1, e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(tracks)
    }
}

/// Chooses a medium-sized cover: the second-smallest image by width, or the
/// only image when there is just one.
///
/// Images are sorted here instead of trusting the provider's ordering.
pub fn pick_cover_art(images: &[CatalogImage]) -> Option<&CatalogImage> {
    let mut sorted: Vec<&CatalogImage> = images.iter().collect();
    sorted.sort_by_key(|img| img.width.unwrap_or(0));
    sorted.get(1).or_else(|| sorted.first()).copied()
}

fn first_non_empty(values: &[String]) -> Option<String> {
    values
        .iter()
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(str::to_string)
}
