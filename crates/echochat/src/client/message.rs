use crate::Error;
use serde_derive::Serialize;

/// Frames sent by the widget, received by the chat backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "msg")]
    Msg {
        text: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    #[serde(rename = "typing")]
    Typing {
        #[serde(rename = "isTyping")]
        is_typing: bool,
    },

    #[serde(rename = "ack")]
    Ack { id: String },
}

impl ClientMessage {
    pub fn msg(text: impl Into<String>, id: impl Into<String>) -> Self {
        ClientMessage::Msg {
            text: text.into(),
            id: Some(id.into()),
        }
    }

    pub fn typing(is_typing: bool) -> Self {
        ClientMessage::Typing { is_typing }
    }

    pub fn ack(id: impl Into<String>) -> Self {
        ClientMessage::Ack { id: id.into() }
    }

    /// The optimistic client id carried by a `msg` frame.
    pub fn client_id(&self) -> Option<&str> {
        match self {
            ClientMessage::Msg { id, .. } => id.as_deref(),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_client_message_json() {
        let tests = vec![
            (
                ClientMessage::msg("hi", "c1"),
                json!({"type": "msg", "text": "hi", "id": "c1"}),
            ),
            (
                ClientMessage::Msg {
                    text: "no id".to_owned(),
                    id: None,
                },
                json!({"type": "msg", "text": "no id"}),
            ),
            (
                ClientMessage::typing(true),
                json!({"type": "typing", "isTyping": true}),
            ),
            (ClientMessage::ack("s9"), json!({"type": "ack", "id": "s9"})),
        ];

        for (msg, expected) in tests {
            let json = msg.to_json().expect("serialize");
            let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
            assert_eq!(value, expected, "for {msg:?}");
        }
    }

    #[test]
    fn client_id_only_on_msg() {
        assert_eq!(ClientMessage::msg("a", "x").client_id(), Some("x"));
        assert_eq!(ClientMessage::typing(false).client_id(), None);
    }
}
