use crate::{ChatMessage, Error, Result};
use serde_derive::{Deserialize, Serialize};

/// Which remote party a typing frame is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Bot,
    Agent,
}

/// Human agent that took over the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AgentInfo {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Agent")
    }
}

/// Frames pushed by the chat backend
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "hello")]
    Hello {
        #[serde(rename = "sessionId", default)]
        session_id: String,
        #[serde(rename = "onlineAgents", default)]
        online_agents: u32,
    },

    #[serde(rename = "history")]
    History {
        #[serde(default)]
        items: Vec<ChatMessage>,
    },

    #[serde(rename = "msg")]
    Msg { message: ChatMessage },

    #[serde(rename = "msg-ack")]
    MsgAck {
        #[serde(rename = "clientId")]
        client_id: String,
        #[serde(rename = "serverId", default)]
        server_id: Option<String>,
    },

    #[serde(rename = "typing")]
    Typing {
        who: Party,
        #[serde(rename = "isTyping")]
        is_typing: bool,
    },

    #[serde(rename = "takeover.started")]
    TakeoverStarted { agent: AgentInfo },

    #[serde(rename = "takeover.ended")]
    TakeoverEnded {},

    #[serde(rename = "presence")]
    Presence {
        #[serde(rename = "onlineAgents", default)]
        online_agents: u32,
    },

    #[serde(rename = "error")]
    Error {
        code: String,
        #[serde(default)]
        message: Option<String>,
    },

    /// A tag this client does not know about.
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    pub fn from_json(msg: &str) -> Result<ServerMessage> {
        if msg.trim().is_empty() {
            return Err(Error::Empty);
        }

        serde_json::from_str(msg).map_err(|e| Error::DecodeFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Content, Role};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_handle_various_messages() -> Result<()> {
        let tests = vec![
            (
                r#"{"type":"hello","sessionId":"s1","onlineAgents":3}"#,
                ServerMessage::Hello {
                    session_id: "s1".to_owned(),
                    online_agents: 3,
                },
            ),
            (
                // missing counter falls back to zero
                r#"{"type":"presence"}"#,
                ServerMessage::Presence { online_agents: 0 },
            ),
            (
                r#"{"type":"history"}"#,
                ServerMessage::History { items: vec![] },
            ),
            (
                r#"{"type":"msg-ack","clientId":"c1","serverId":"s1"}"#,
                ServerMessage::MsgAck {
                    client_id: "c1".to_owned(),
                    server_id: Some("s1".to_owned()),
                },
            ),
            (
                r#"{"type":"typing","who":"agent","isTyping":true}"#,
                ServerMessage::Typing {
                    who: Party::Agent,
                    is_typing: true,
                },
            ),
            (
                r#"{"type":"takeover.started","agent":{"id":"a1","name":"Sam"}}"#,
                ServerMessage::TakeoverStarted {
                    agent: AgentInfo {
                        id: "a1".to_owned(),
                        name: Some("Sam".to_owned()),
                    },
                },
            ),
            (
                r#"{"type":"takeover.ended"}"#,
                ServerMessage::TakeoverEnded {},
            ),
            (
                r#"{"type":"error","code":"RATE_LIMIT"}"#,
                ServerMessage::Error {
                    code: "RATE_LIMIT".to_owned(),
                    message: None,
                },
            ),
            (r#"{"type":"shiny.new.thing","x":1}"#, ServerMessage::Unknown),
        ];

        for (input, expected) in tests {
            assert_eq!(
                ServerMessage::from_json(input)?,
                expected,
                "for input: {}",
                input
            );
        }

        Ok(())
    }

    #[test]
    fn test_inbound_chat_message() -> Result<()> {
        let msg = ServerMessage::from_json(
            r#"{"type":"msg","message":{"id":"b1","role":"bot","text":"hey","at":5}}"#,
        )?;
        let ServerMessage::Msg { message } = msg else {
            panic!("expected msg, got {msg:?}");
        };
        assert_eq!(message.id, "b1");
        assert_eq!(message.role, Role::Bot);
        assert_eq!(message.content, Content::Text("hey".to_owned()));
        Ok(())
    }

    #[test]
    fn test_malformed_messages() {
        let tests = [
            "",
            "   ",
            "not json",
            "[1,2,3]",
            r#"{"no":"type"}"#,
            r#"{"type":"msg"}"#,
            r#"{"type":"typing","who":"martian","isTyping":true}"#,
            r#"{"type":"msg-ack"}"#,
        ];

        for input in tests {
            assert!(
                ServerMessage::from_json(input).is_err(),
                "expected error for input: {input}"
            );
        }
    }
}
