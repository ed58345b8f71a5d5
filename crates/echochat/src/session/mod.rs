use std::time::Instant;

use crossbeam_channel::Receiver;

use crate::{
    api::HttpChatApi, identity::IdentityProvider, state::Change, ChatConfig, Content, Role,
    SessionState, Transport,
};

mod dispatch;
mod live;
mod mock;
mod store;

pub use live::LiveSession;
pub use mock::MockSession;

/// The interface the presentation layer drives. Every call returns
/// immediately; waiting (for acks, replies, reconnects) is state that
/// [`ChatEngine::poll`] advances.
pub trait ChatEngine {
    fn state(&self) -> &SessionState;

    /// A channel that receives one [`Change`] per state mutation.
    fn subscribe(&mut self) -> Receiver<Change>;

    /// One-shot history fetch for first paint.
    fn load_history(&mut self, bot_id: &str);

    /// Open (or replace) the realtime channel for `bot_id`.
    fn connect_ws(&mut self, bot_id: &str);

    /// Close the realtime channel and stop reconnecting. Idempotent.
    fn disconnect_ws(&mut self);

    /// Append an optimistic user message and get it to the backend. Safe in
    /// any connection state. Returns the message's client id.
    fn send_message(&mut self, text: &str) -> String;

    /// Sets the sender's own typing flag.
    fn set_typing(&mut self, typing: bool);

    fn start_typing(&mut self) {
        self.set_typing(true)
    }

    fn stop_typing(&mut self) {
        self.set_typing(false)
    }

    fn set_draft(&mut self, draft: &str);

    /// Append a message authored locally (rendered bot output, notices).
    fn add(&mut self, role: Role, content: Content) -> String;

    /// Append a non-user reply, optionally clearing the typing flag.
    fn mock_reply(&mut self, role: Role, content: Content, stop_typing: bool) {
        self.add(role, content);
        if stop_typing {
            self.stop_typing();
        }
    }

    /// Empty the conversation and draft. The connection is left alone.
    fn clear(&mut self);

    /// Drain transport events, fire due timers and collect finished requests.
    fn poll(&mut self, now: Instant);
}

/// Picks the engine strategy once, from `config.mock`.
pub fn build_engine<T>(
    config: &ChatConfig,
    transport: T,
    identity: Box<dyn IdentityProvider>,
) -> Box<dyn ChatEngine>
where
    T: Transport + 'static,
    T::Conn: 'static,
{
    if config.mock {
        return Box::new(MockSession::new(config));
    }

    let api = Box::new(HttpChatApi::new(config.endpoint()));
    Box::new(LiveSession::new(config, transport, api, identity))
}
