//! Derives backend URLs for a room.

use crate::Result;
use url::Url;

/// The `(botId, anonId)` pair identifying one logical conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomKey {
    pub bot_id: String,
    pub anon_id: String,
}

impl RoomKey {
    pub fn new(bot_id: impl Into<String>, anon_id: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            anon_id: anon_id.into(),
        }
    }
}

/// Where the backend lives. `secure` mirrors whether the hosting page is
/// served over TLS and picks `wss`/`https` over `ws`/`http`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub secure: bool,
    pub api_path: String,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, secure: bool) -> Self {
        Self {
            host: host.into(),
            secure,
            api_path: "/api/chat".to_owned(),
        }
    }

    pub fn with_api_path(mut self, path: impl Into<String>) -> Self {
        self.api_path = path.into();
        self
    }

    /// `<ws|wss>://<host>/ws/chat?botId=<id>&anonId=<id>`
    pub fn ws_url(&self, room: &RoomKey) -> Result<Url> {
        let scheme = if self.secure { "wss" } else { "ws" };
        let mut url = Url::parse(&format!("{scheme}://{}/ws/chat", self.host))?;
        url.query_pairs_mut()
            .append_pair("botId", &room.bot_id)
            .append_pair("anonId", &room.anon_id);
        Ok(url)
    }

    /// `<http|https>://<host><api_path>/<action>`
    pub fn api_url(&self, action: &str) -> Result<Url> {
        let scheme = if self.secure { "https" } else { "http" };
        let path = self.api_path.trim_matches('/');
        let url = if path.is_empty() {
            format!("{scheme}://{}/{action}", self.host)
        } else {
            format!("{scheme}://{}/{path}/{action}", self.host)
        };
        Ok(Url::parse(&url)?)
    }

    pub fn history_url(&self, room: &RoomKey) -> Result<Url> {
        let mut url = self.api_url("history")?;
        url.query_pairs_mut()
            .append_pair("botId", &room.bot_id)
            .append_pair("anonId", &room.anon_id);
        Ok(url)
    }
}
