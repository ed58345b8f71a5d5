use std::path::PathBuf;
use std::time::Duration;

use crate::{storage::DataPath, Endpoint};

/// What to do with the canonical record returned by a fallback HTTP send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackEcho {
    /// Keep the optimistic entry and append the server's copy after it.
    Append,
    /// Swap the optimistic entry for the server's copy in place.
    #[default]
    Replace,
}

const DEFAULT_MOCK_REPLIES: &[&str] = &[
    "Thanks for reaching out! Someone will be with you shortly.",
    "Good question. Let me look into that for you.",
    "Got it. Is there anything else I can help with?",
];

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub host: String,
    pub secure: bool,
    pub api_path: String,

    /// Pick the simulated engine instead of the realtime one.
    pub mock: bool,
    pub mock_reply_delay: Duration,
    pub mock_replies: Vec<String>,

    /// Ping interval while open. `None` disables pings.
    pub keepalive: Option<Duration>,
    pub fallback_echo: FallbackEcho,
    pub data_dir: PathBuf,
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig {
            host: "localhost:8080".to_string(),
            secure: false,
            api_path: "/api/chat".to_string(),
            mock: false,
            mock_reply_delay: Duration::from_millis(1200),
            mock_replies: DEFAULT_MOCK_REPLIES.iter().map(|s| s.to_string()).collect(),
            keepalive: Some(Duration::from_secs(45)),
            fallback_echo: FallbackEcho::default(),
            data_dir: DataPath::default_base_or_cwd(),
        }
    }
}

impl ChatConfig {
    /// Defaults, overridden by `ECHOCHAT_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ChatConfig::default();

        if let Some(host) = lookup("ECHOCHAT_HOST") {
            config.host = host;
        }
        if let Some(secure) = lookup("ECHOCHAT_SECURE").and_then(|v| parse_flag(&v)) {
            config.secure = secure;
        }
        if let Some(mock) = lookup("ECHOCHAT_MOCK").and_then(|v| parse_flag(&v)) {
            config.mock = mock;
        }
        if let Some(path) = lookup("ECHOCHAT_API_PATH") {
            config.api_path = path;
        }
        if let Some(dir) = lookup("ECHOCHAT_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        config
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.host.clone(), self.secure).with_api_path(self.api_path.clone())
    }

    pub fn data_path(&self) -> DataPath {
        DataPath::new(&self.data_dir)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_overrides_defaults() {
        let vars: HashMap<&str, &str> = [
            ("ECHOCHAT_HOST", "chat.example.com"),
            ("ECHOCHAT_SECURE", "yes"),
            ("ECHOCHAT_MOCK", "garbage"),
            ("ECHOCHAT_DATA_DIR", "/tmp/echo"),
        ]
        .into_iter()
        .collect();

        let config = ChatConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.host, "chat.example.com");
        assert!(config.secure);
        // unparseable flags keep the default
        assert!(!config.mock);
        assert_eq!(config.api_path, "/api/chat");
        assert_eq!(config.data_dir, PathBuf::from("/tmp/echo"));
        assert_eq!(config.endpoint(), Endpoint::new("chat.example.com", true));
    }
}
