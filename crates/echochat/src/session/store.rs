use crossbeam_channel::Receiver;

use crate::{
    state::{Change, Notifier, SessionState},
    AgentInfo, ChatMessage, ConnectionStatus, Party,
};

/// Owns [`SessionState`] and publishes a [`Change`] for every mutation that
/// actually changed something.
#[derive(Debug, Default)]
pub(crate) struct StateStore {
    state: SessionState,
    notifier: Notifier,
}

impl StateStore {
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn subscribe(&mut self) -> Receiver<Change> {
        self.notifier.subscribe()
    }

    pub fn has_message(&self, id: &str) -> bool {
        self.state.messages.iter().any(|m| m.id == id)
    }

    pub fn push_message(&mut self, msg: ChatMessage) {
        self.state.messages.push(msg);
        self.notifier.publish(Change::Messages);
    }

    pub fn replace_messages(&mut self, messages: Vec<ChatMessage>) {
        self.state.messages = messages;
        self.notifier.publish(Change::Messages);
    }

    pub fn remove_message(&mut self, id: &str) -> bool {
        let before = self.state.messages.len();
        self.state.messages.retain(|m| m.id != id);
        let removed = self.state.messages.len() != before;
        if removed {
            self.notifier.publish(Change::Messages);
        }
        removed
    }

    /// Swaps the message with `id` for `msg`, keeping its position.
    pub fn replace_message(&mut self, id: &str, msg: ChatMessage) -> bool {
        let Some(slot) = self.state.messages.iter_mut().find(|m| m.id == id) else {
            return false;
        };
        *slot = msg;
        self.notifier.publish(Change::Messages);
        true
    }

    pub fn set_draft(&mut self, draft: &str) {
        if self.state.draft == draft {
            return;
        }
        self.state.draft = draft.to_owned();
        self.notifier.publish(Change::Draft);
    }

    /// Empties the conversation and the draft.
    pub fn clear_conversation(&mut self) {
        if !self.state.messages.is_empty() {
            self.state.messages.clear();
            self.notifier.publish(Change::Messages);
        }
        self.set_draft("");
    }

    pub fn set_typing(&mut self, typing: bool) {
        if self.state.typing == typing {
            return;
        }
        self.state.typing = typing;
        self.notifier.publish(Change::LocalTyping);
    }

    pub fn set_remote_typing(&mut self, who: Party, typing: bool) {
        let flag = match who {
            Party::Bot => &mut self.state.typing_users.bot,
            Party::Agent => &mut self.state.typing_users.agent,
        };
        if *flag == typing {
            return;
        }
        *flag = typing;
        self.notifier.publish(Change::Typing);
    }

    pub fn clear_remote_typing(&mut self) {
        self.set_remote_typing(Party::Bot, false);
        self.set_remote_typing(Party::Agent, false);
    }

    pub fn set_status(&mut self, status: ConnectionStatus) {
        if self.state.connection.status == status {
            return;
        }
        self.state.connection.status = status;
        self.notifier.publish(Change::Connection);
    }

    pub fn set_reconnect_attempt(&mut self, attempt: u32) {
        if self.state.connection.reconnect_attempt == attempt {
            return;
        }
        self.state.connection.reconnect_attempt = attempt;
        self.notifier.publish(Change::Connection);
    }

    pub fn start_takeover(&mut self, agent: AgentInfo) {
        self.state.takeover.start(agent);
        self.notifier.publish(Change::Takeover);
    }

    pub fn end_takeover(&mut self) -> Option<AgentInfo> {
        let left = self.state.takeover.end();
        self.notifier.publish(Change::Takeover);
        left
    }

    pub fn set_online_agents(&mut self, count: u32) {
        if self.state.online_agents == count {
            return;
        }
        self.state.online_agents = count;
        self.notifier.publish(Change::Presence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    #[test]
    fn publishes_only_real_changes() {
        let mut store = StateStore::default();
        let rx = store.subscribe();

        store.set_typing(false);
        store.set_online_agents(0);
        assert!(rx.try_recv().is_err());

        store.set_typing(true);
        store.set_remote_typing(Party::Bot, true);
        store.push_message(ChatMessage::new(Role::User, "hi"));

        let changes: Vec<Change> = rx.try_iter().collect();
        assert_eq!(
            changes,
            vec![Change::LocalTyping, Change::Typing, Change::Messages]
        );
    }

    #[test]
    fn replace_keeps_position() {
        let mut store = StateStore::default();
        let a = ChatMessage::new(Role::User, "a");
        let b = ChatMessage::new(Role::Bot, "b");
        let a_id = a.id.clone();
        store.push_message(a);
        store.push_message(b);

        let canonical = ChatMessage::with_id("server-1".to_owned(), Role::User, "a");
        assert!(store.replace_message(&a_id, canonical));
        assert_eq!(store.state().messages[0].id, "server-1");
        assert_eq!(store.state().messages.len(), 2);
        assert!(!store.replace_message("missing", ChatMessage::new(Role::Bot, "x")));
    }
}
