use crate::config::ClientConfig;
use anyhow::{Context, Result, anyhow};
use meshcall_core::RoomId;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;
use url::Url;

#[derive(Debug, Deserialize)]
struct RoomCode {
    room_id: RoomId,
}

/// Client for the server's `/rooms` endpoints.
#[derive(Debug, Clone)]
pub struct RoomsClient {
    base_url: Url,
    http: Client,
}

impl RoomsClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            base_url: config.http_url()?,
            http: Client::new(),
        })
    }

    /// Reserve a fresh room code.
    pub async fn create_room(&self) -> Result<RoomId> {
        let url = self.url(&["rooms"])?;
        let response = self.http.post(url.clone()).send().await?;
        let code: RoomCode = response
            .error_for_status()
            .with_context(|| format!("POST {}", url))?
            .json()
            .await?;
        Ok(code.room_id)
    }

    /// A public room with a free seat, `None` when there is none.
    pub async fn quick_join(&self) -> Result<Option<RoomId>> {
        let url = self.url(&["rooms", "quick-join"])?;
        let response = self.http.post(url.clone()).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("No public room has a free seat");
            return Ok(None);
        }
        let code: RoomCode = response
            .error_for_status()
            .with_context(|| format!("POST {}", url))?
            .json()
            .await?;
        Ok(Some(code.room_id))
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("{} cannot be a base url", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
