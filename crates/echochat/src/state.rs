use crossbeam_channel::{Receiver, Sender};

use crate::{AgentInfo, ChatMessage, ConnectionStatus};

/// What the remote side is doing. Local user typing lives in
/// [`SessionState::typing`] and is never merged in here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypingState {
    pub bot: bool,
    pub agent: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TakeoverState {
    active: bool,
    agent: Option<AgentInfo>,
}

impl TakeoverState {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn agent(&self) -> Option<&AgentInfo> {
        self.agent.as_ref()
    }

    /// A start always replaces whatever agent was recorded before.
    pub fn start(&mut self, agent: AgentInfo) {
        self.active = true;
        self.agent = Some(agent);
    }

    /// Ends the takeover, handing back the agent that left.
    pub fn end(&mut self) -> Option<AgentInfo> {
        self.active = false;
        self.agent.take()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    /// Reconnects scheduled since the last successful open.
    pub reconnect_attempt: u32,
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        self.status == ConnectionStatus::Open
    }
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub messages: Vec<ChatMessage>,
    pub draft: String,
    /// The sender's own typing flag.
    pub typing: bool,
    pub typing_users: TypingState,
    pub connection: ConnectionState,
    pub takeover: TakeoverState,
    pub online_agents: u32,
}

impl SessionState {
    pub fn connected(&self) -> bool {
        self.connection.is_open()
    }

    pub fn taken_over(&self) -> bool {
        self.takeover.is_active()
    }

    pub fn agent(&self) -> Option<&AgentInfo> {
        self.takeover.agent()
    }

    pub fn message(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }
}

/// Which part of [`SessionState`] changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Change {
    Messages,
    Draft,
    LocalTyping,
    Typing,
    Connection,
    Takeover,
    Presence,
}

/// Fans state changes out to subscribers over channels. Subscribers that
/// dropped their receiver are pruned on the next publish.
#[derive(Debug, Default)]
pub struct Notifier {
    subscribers: Vec<Sender<Change>>,
}

impl Notifier {
    pub fn subscribe(&mut self) -> Receiver<Change> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn publish(&mut self, change: Change) {
        self.subscribers.retain(|tx| tx.send(change).is_ok());
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
