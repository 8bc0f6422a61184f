use async_trait::async_trait;

use crate::error::CatalogError;
use crate::sources::ArtworkApi;

/// Fetches cover images over plain HTTP.
pub struct HttpArtwork {
    client: reqwest::Client,
}

impl HttpArtwork {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ArtworkApi for HttpArtwork {
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, CatalogError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(CatalogError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }

        let data = resp
            .bytes()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?
            .to_vec();

        if data.is_empty() {
            return Err(CatalogError::Malformed(format!("empty image at {}", url)));
        }
        Ok(data)
    }
}
