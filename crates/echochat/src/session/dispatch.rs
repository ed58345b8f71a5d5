use tracing::{debug, info, warn};

use crate::{ChatMessage, Party, ServerMessage, Transport};

use super::LiveSession;

impl<T: Transport> LiveSession<T> {
    /// Applies one inbound text frame. Frames that do not decode are dropped.
    #[profiling::function]
    pub(super) fn handle_frame(&mut self, text: &str) {
        let msg = match ServerMessage::from_json(text) {
            Ok(msg) => msg,
            Err(err) => {
                debug!("dropping malformed frame: {err}");
                return;
            }
        };

        self.handle_server_message(msg);
    }

    fn handle_server_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::Hello {
                session_id,
                online_agents,
            } => {
                info!("chat session {session_id}, {online_agents} agents online");
                self.store_mut().set_online_agents(online_agents);
            }

            ServerMessage::Presence { online_agents } => {
                self.store_mut().set_online_agents(online_agents);
            }

            ServerMessage::History { items } => {
                self.replace_history(items);
            }

            ServerMessage::Msg { message } => {
                self.store_mut().push_message(message);
            }

            ServerMessage::MsgAck {
                client_id,
                server_id,
            } => {
                debug!("ack {client_id} -> {server_id:?}");
                self.pending.remove(&client_id);
            }

            ServerMessage::Typing { who, is_typing } => {
                self.store_mut().set_remote_typing(who, is_typing);
            }

            ServerMessage::TakeoverStarted { agent } => {
                let notice = format!("{} joined the chat", agent.display_name());
                let store = self.store_mut();
                store.start_takeover(agent);
                store.push_message(ChatMessage::notice(notice));
            }

            ServerMessage::TakeoverEnded {} => {
                let store = self.store_mut();
                let left = store.end_takeover();
                let name = left.as_ref().map(|a| a.display_name()).unwrap_or("Agent");
                store.push_message(ChatMessage::notice(format!("{name} left the chat")));
                store.set_remote_typing(Party::Agent, false);
            }

            ServerMessage::Error { code, message } => {
                warn!("chat backend error {code}: {message:?}");
                let notice = match message {
                    Some(message) => format!("{code}: {message}"),
                    None => code,
                };
                self.store_mut().push_message(ChatMessage::notice(notice));
            }

            ServerMessage::Unknown => {
                debug!("ignoring unknown frame type");
            }
        }
    }
}
