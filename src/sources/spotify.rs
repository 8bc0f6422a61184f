use async_trait::async_trait;
use base64::Engine;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::SpotifyConfig;
use crate::error::CatalogError;
use crate::models::{CatalogAlbum, CatalogImage, CatalogPlaylist, CatalogTrack};
use crate::sources::CatalogApi;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const API_BASE: &str = "https://api.spotify.com/v1";

/// Spotify Web API client, authenticated once with a client-credentials grant.
pub struct SpotifyClient {
    client: reqwest::Client,
    access_token: String,
    api_base: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct SpotifyTrack {
    id: Option<String>,
    name: String,
    artists: Vec<SpotifyArtist>,
    album: SpotifyAlbumRef,
    track_number: u32,
    #[serde(default)]
    external_ids: ExternalIds,
}

#[derive(Deserialize, Default)]
struct ExternalIds {
    isrc: Option<String>,
}

#[derive(Deserialize)]
struct SpotifyArtist {
    name: String,
}

#[derive(Deserialize)]
struct SpotifyAlbumRef {
    id: Option<String>,
    name: String,
    release_date: Option<String>,
    #[serde(default)]
    images: Vec<SpotifyImage>,
}

#[derive(Deserialize)]
struct SpotifyImage {
    url: String,
    width: Option<u32>,
}

#[derive(Deserialize)]
struct SpotifyAlbum {
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
}

#[derive(Deserialize)]
struct SpotifyPlaylist {
    id: String,
    name: String,
    public: Option<bool>,
    tracks: PlaylistPage,
}

#[derive(Deserialize)]
struct PlaylistPage {
    items: Vec<PlaylistItem>,
    next: Option<String>,
}

#[derive(Deserialize)]
struct PlaylistItem {
    track: Option<PlaylistTrackRef>,
}

#[derive(Deserialize)]
struct PlaylistTrackRef {
    id: Option<String>,
}

impl SpotifyClient {
    /// client credentials 방식으로 토큰을 발급받아 클라이언트를 만든다.
    pub async fn connect(config: &SpotifyConfig) -> Result<Self, CatalogError> {
        let client_id = config
            .client_id
            .as_deref()
            .ok_or_else(|| CatalogError::Auth("Spotify client_id is not set".to_string()))?;
        let client_secret = config
            .client_secret
            .as_deref()
            .ok_or_else(|| CatalogError::Auth("Spotify client_secret is not set".to_string()))?;

        let client = reqwest::Client::new();
        let access_token = Self::authenticate(&client, client_id, client_secret).await?;
        tracing::info!("authenticated with Spotify");

        Ok(Self {
            client,
            access_token,
            api_base: API_BASE.to_string(),
        })
    }

    async fn authenticate(
        client: &reqwest::Client,
        client_id: &str,
        client_secret: &str,
    ) -> Result<String, CatalogError> {
        let credentials = format!("{}:{}", client_id, client_secret);
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);

        let resp = client
            .post(TOKEN_URL)
            .header("Authorization", format!("Basic {}", encoded))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(CatalogError::Auth(format!(
                "token request returned {}. Check client_id and client_secret",
                resp.status()
            )));
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| CatalogError::Auth(format!("unreadable token response: {}", e)))?;
        Ok(token.access_token)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        tracing::debug!("GET {}", url);
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        resp.json()
            .await
            .map_err(|e| CatalogError::Malformed(format!("{}: {}", url, e)))
    }

    fn convert_track(track: SpotifyTrack) -> Result<CatalogTrack, CatalogError> {
        let id = track
            .id
            .ok_or_else(|| CatalogError::Malformed(format!("track '{}' has no id", track.name)))?;
        let album_id = track.album.id.ok_or_else(|| {
            CatalogError::Malformed(format!("album of track {} has no id", id))
        })?;

        Ok(CatalogTrack {
            id,
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            album_id,
            album_name: track.album.name,
            album_images: track
                .album
                .images
                .into_iter()
                .map(|img| CatalogImage {
                    url: img.url,
                    width: img.width,
                })
                .collect(),
            release_date: track.album.release_date,
            track_number: track.track_number,
            isrc: track.external_ids.isrc,
        })
    }

    fn member_ids(page: PlaylistPage, ids: &mut Vec<Option<String>>) -> Option<String> {
        ids.extend(
            page.items
                .into_iter()
                .map(|item| item.track.and_then(|t| t.id)),
        );
        page.next
    }
}

#[async_trait]
impl CatalogApi for SpotifyClient {
    async fn get_track(&self, id: &str) -> Result<CatalogTrack, CatalogError> {
        let url = format!("{}/tracks/{}", self.api_base, id);
        let track: SpotifyTrack = self.get_json(&url).await?;
        Self::convert_track(track)
    }

    async fn get_album(&self, id: &str) -> Result<CatalogAlbum, CatalogError> {
        let url = format!("{}/albums/{}", self.api_base, id);
        let album: SpotifyAlbum = self.get_json(&url).await?;
        Ok(CatalogAlbum {
            genres: album.genres,
            artists: album.artists.into_iter().map(|a| a.name).collect(),
        })
    }

    async fn get_playlist(&self, id: &str) -> Result<CatalogPlaylist, CatalogError> {
        let url = format!("{}/playlists/{}", self.api_base, id);
        let playlist: SpotifyPlaylist = self.get_json(&url).await?;

        let mut track_ids = Vec::new();
        let mut next = Self::member_ids(playlist.tracks, &mut track_ids);
        while let Some(page_url) = next {
            let page: PlaylistPage = self.get_json(&page_url).await?;
            next = Self::member_ids(page, &mut track_ids);
        }
        tracing::debug!("playlist {} has {} entries", playlist.id, track_ids.len());

        Ok(CatalogPlaylist {
            id: playlist.id,
            name: playlist.name,
            public: playlist.public,
            track_ids,
        })
    }
}
