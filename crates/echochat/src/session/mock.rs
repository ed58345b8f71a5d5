use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use rand::seq::IndexedRandom;
use tracing::debug;

use crate::{
    session::{store::StateStore, ChatEngine},
    state::Change,
    ChatConfig, ChatMessage, Content, Role, SessionState,
};

/// Offline engine for demos and previews. Sends are answered with a canned
/// bot reply after a fixed delay; nothing touches the network.
pub struct MockSession {
    store: StateStore,
    reply_delay: Duration,
    replies: Vec<String>,
    scheduled: Vec<Instant>,
}

impl MockSession {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            store: StateStore::default(),
            reply_delay: config.mock_reply_delay,
            replies: config.mock_replies.clone(),
            scheduled: Vec::new(),
        }
    }

    /// Replies still waiting to be delivered.
    pub fn scheduled_replies(&self) -> usize {
        self.scheduled.len()
    }

    fn canned_reply(&self) -> String {
        self.replies
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| "...".to_owned())
    }
}

impl ChatEngine for MockSession {
    fn state(&self) -> &SessionState {
        self.store.state()
    }

    fn subscribe(&mut self) -> Receiver<Change> {
        self.store.subscribe()
    }

    fn load_history(&mut self, _bot_id: &str) {}

    fn connect_ws(&mut self, bot_id: &str) {
        debug!("mock session ignoring connect to {bot_id}");
    }

    fn disconnect_ws(&mut self) {}

    fn send_message(&mut self, text: &str) -> String {
        let msg = ChatMessage::new(Role::User, text);
        let id = msg.id.clone();
        self.store.push_message(msg);
        self.store.set_typing(true);
        self.scheduled.push(Instant::now() + self.reply_delay);
        id
    }

    fn set_typing(&mut self, typing: bool) {
        self.store.set_typing(typing);
    }

    fn set_draft(&mut self, draft: &str) {
        self.store.set_draft(draft);
    }

    fn add(&mut self, role: Role, content: Content) -> String {
        let msg = ChatMessage::new(role, content);
        let id = msg.id.clone();
        self.store.push_message(msg);
        id
    }

    fn clear(&mut self) {
        self.store.clear_conversation();
        self.scheduled.clear();
        self.store.set_typing(false);
    }

    fn poll(&mut self, now: Instant) {
        let due = self.scheduled.iter().filter(|at| **at <= now).count();
        if due == 0 {
            return;
        }

        self.scheduled.retain(|at| *at > now);
        for _ in 0..due {
            let reply = self.canned_reply();
            self.mock_reply(Role::Bot, Content::Text(reply), true);
        }
    }
}
