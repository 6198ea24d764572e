use crate::speaking::{DEFAULT_SAMPLE_INTERVAL, DEFAULT_SPEAKING_THRESHOLD};
use meshcall_core::{IceServerConfig, RoomId};
use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base address of the signaling server, `ws://` or `http://`.
    pub server_url: String,
    pub room_id: RoomId,
    pub display_name: String,
    /// Only honoured when this join creates the room.
    pub public: bool,
    pub speaking_threshold: f32,
    pub sample_interval_ms: u64,
    /// Used until the server's `welcome` supplies its own list.
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:8080".to_owned(),
            room_id: RoomId::from("lobby"),
            display_name: "guest".to_owned(),
            public: true,
            speaking_threshold: DEFAULT_SPEAKING_THRESHOLD,
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL.as_millis() as u64,
            ice_servers: Vec::new(),
        }
    }
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>, room_id: RoomId, display_name: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            room_id,
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms.max(1))
    }

    /// `…/ws/{room}?name=..&public=..`
    pub fn signaling_url(&self) -> Result<Url> {
        let mut url = self.http_url()?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|_| anyhow!("Cannot use {} for signaling", self.server_url))?;

        url.path_segments_mut()
            .map_err(|_| anyhow!("{} cannot be a base url", self.server_url))?
            .pop_if_empty()
            .push("ws")
            .push(self.room_id.as_str());
        url.query_pairs_mut()
            .append_pair("name", &self.display_name)
            .append_pair("public", if self.public { "true" } else { "false" });

        Ok(url)
    }

    /// The server address with an `http(s)` scheme, for the rooms API.
    pub fn http_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.server_url)
            .with_context(|| format!("Invalid server url {}", self.server_url))?;
        let scheme = match url.scheme() {
            "ws" | "http" => "http",
            "wss" | "https" => "https",
            other => bail!("Unsupported server url scheme '{}'", other),
        };
        url.set_scheme(scheme)
            .map_err(|_| anyhow!("Cannot use {} over http", self.server_url))?;
        Ok(url)
    }
}
