use chrono::{DateTime, Utc};
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Who authored a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
    Admin,
}

/// Message body. Plain text travels as a JSON string, pre-rendered rich
/// content (html from the markdown layer) as `{"html": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Rich { html: String },
}

impl Content {
    pub fn text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s),
            Content::Rich { .. } => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Content::Text(s) => s,
            Content::Rich { html } => html,
        }
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::Text(s)
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::Text(s.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    #[serde(rename = "text")]
    pub content: Content,
    #[serde(rename = "at", with = "epoch_millis")]
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// A message stamped with a fresh id and the current time.
    pub fn new(role: Role, content: impl Into<Content>) -> Self {
        Self::with_id(new_id(), role, content)
    }

    pub fn with_id(id: String, role: Role, content: impl Into<Content>) -> Self {
        ChatMessage {
            id,
            role,
            content: content.into(),
            timestamp: now(),
        }
    }

    /// Client-side notice shown inline in the conversation.
    pub fn notice(text: impl Into<String>) -> Self {
        Self::new(Role::Admin, Content::Text(text.into()))
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// chat timestamps travel as epoch millis, keep local ones at the same precision
fn now() -> DateTime<Utc> {
    let ms = Utc::now().timestamp_millis();
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

/// Epoch millis on the wire. Some backends send them as floats; the
/// fractional part is dropped.
mod epoch_millis {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Int(i64),
        Float(f64),
    }

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(at.timestamp_millis())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let ms = match Millis::deserialize(d)? {
            Millis::Int(ms) => ms,
            Millis::Float(ms) if ms.is_finite() => ms.floor() as i64,
            Millis::Float(ms) => {
                return Err(de::Error::custom(format!("invalid timestamp {ms}")));
            }
        };

        DateTime::from_timestamp_millis(ms)
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {ms}")))
    }
}
