use async_trait::async_trait;
use serde::Deserialize;

use crate::config::YouTubeConfig;
use crate::error::{Error, TrackError};
use crate::models::SourceLocator;
use crate::sources::SearchApi;

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";

/// YouTube Data API v3 video search.
pub struct YouTubeClient {
    client: reqwest::Client,
    api_key: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Deserialize)]
struct SearchItem {
    id: ItemId,
}

#[derive(Deserialize)]
struct ItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

impl YouTubeClient {
    pub fn new(config: &YouTubeConfig) -> Result<Self, Error> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("YouTube api_key is not set".to_string()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
        })
    }

    fn convert(resp: SearchResponse) -> Vec<SourceLocator> {
        resp.items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .map(SourceLocator::new)
            .collect()
    }
}

#[async_trait]
impl SearchApi for YouTubeClient {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SourceLocator>, TrackError> {
        let limit = limit.to_string();
        let resp = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("part", "id"),
                ("type", "video"),
                ("q", query),
                ("maxResults", limit.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| TrackError::Search(e.to_string()))?
            .error_for_status()
            .map_err(|e| TrackError::Search(e.to_string()))?;

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| TrackError::Search(format!("unreadable search response: {}", e)))?;

        Ok(Self::convert(body))
    }
}
