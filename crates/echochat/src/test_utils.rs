//! In-memory transport and api doubles for engine tests.

use std::{cell::RefCell, rc::Rc};

use poll_promise::Promise;
use url::Url;

use crate::{
    api::{ApiPromise, ChatApi},
    conn::{Connection, Transport, TransportEvent},
    ChatMessage, Error, Result, Role, RoomKey,
};

#[derive(Default)]
struct ConnState {
    inbound: Vec<TransportEvent>,
    sent: Vec<String>,
    pings: usize,
    closed: bool,
}

#[derive(Default)]
struct Wire {
    urls: Vec<String>,
    conns: Vec<ConnState>,
    sent: Vec<String>,
    fail_next: bool,
}

/// A transport whose connections are driven by the test. Clones share the
/// same wire, so a test keeps one handle and gives another to the session.
#[derive(Clone, Default)]
pub struct MockTransport {
    wire: Rc<RefCell<Wire>>,
}

pub struct MockConn {
    index: usize,
    wire: Rc<RefCell<Wire>>,
}

impl MockTransport {
    pub fn fail_next_connect(&self) {
        self.wire.borrow_mut().fail_next = true;
    }

    pub fn urls(&self) -> Vec<String> {
        self.wire.borrow().urls.clone()
    }

    pub fn connection_count(&self) -> usize {
        self.wire.borrow().conns.len()
    }

    /// Queue an event on the newest connection.
    pub fn push(&self, event: TransportEvent) {
        let index = self.connection_count().saturating_sub(1);
        self.push_to(index, event);
    }

    pub fn push_json(&self, value: serde_json::Value) {
        self.push(TransportEvent::Message(value.to_string()));
    }

    pub fn push_to(&self, index: usize, event: TransportEvent) {
        let mut wire = self.wire.borrow_mut();
        if let Some(conn) = wire.conns.get_mut(index) {
            conn.inbound.push(event);
        }
    }

    /// Frames sent on any connection since the last `take_sent`.
    pub fn sent(&self) -> Vec<String> {
        self.wire.borrow().sent.clone()
    }

    pub fn take_sent(&self) -> Vec<String> {
        std::mem::take(&mut self.wire.borrow_mut().sent)
    }

    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent()
            .iter()
            .map(|s| serde_json::from_str(s).expect("sent frame is json"))
            .collect()
    }

    pub fn sent_on(&self, index: usize) -> Vec<String> {
        self.wire
            .borrow()
            .conns
            .get(index)
            .map(|c| c.sent.clone())
            .unwrap_or_default()
    }

    pub fn closed(&self, index: usize) -> bool {
        self.wire
            .borrow()
            .conns
            .get(index)
            .is_some_and(|c| c.closed)
    }

    pub fn pings(&self) -> usize {
        self.wire.borrow().conns.iter().map(|c| c.pings).sum()
    }
}

impl Transport for MockTransport {
    type Conn = MockConn;

    fn connect(&mut self, url: &Url) -> Result<MockConn> {
        let mut wire = self.wire.borrow_mut();
        if wire.fail_next {
            wire.fail_next = false;
            return Err(Error::Connect {
                url: url.to_string(),
                reason: "refused".to_owned(),
            });
        }

        wire.urls.push(url.to_string());
        wire.conns.push(ConnState::default());
        Ok(MockConn {
            index: wire.conns.len() - 1,
            wire: self.wire.clone(),
        })
    }
}

impl Connection for MockConn {
    fn send(&mut self, frame: String) {
        let mut wire = self.wire.borrow_mut();
        wire.sent.push(frame.clone());
        wire.conns[self.index].sent.push(frame);
    }

    fn ping(&mut self) {
        self.wire.borrow_mut().conns[self.index].pings += 1;
    }

    fn close(&mut self) {
        self.wire.borrow_mut().conns[self.index].closed = true;
    }

    fn try_recv(&mut self) -> Option<TransportEvent> {
        let mut wire = self.wire.borrow_mut();
        let inbound = &mut wire.conns[self.index].inbound;
        if inbound.is_empty() {
            None
        } else {
            Some(inbound.remove(0))
        }
    }
}

#[derive(Default)]
struct ApiState {
    history: Option<Result<Vec<ChatMessage>>>,
    reply: Option<Result<ChatMessage>>,
    sent: Vec<String>,
    history_rooms: Vec<RoomKey>,
}

/// An api whose answers are ready immediately. Without a configured answer
/// history is empty and a send echoes the text back as a user message.
#[derive(Clone, Default)]
pub struct MockApi {
    state: Rc<RefCell<ApiState>>,
}

impl MockApi {
    pub fn history_with(&self, result: Result<Vec<ChatMessage>>) {
        self.state.borrow_mut().history = Some(result);
    }

    pub fn reply_with(&self, result: Result<ChatMessage>) {
        self.state.borrow_mut().reply = Some(result);
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.state.borrow().sent.clone()
    }

    pub fn history_rooms(&self) -> Vec<RoomKey> {
        self.state.borrow().history_rooms.clone()
    }
}

impl ChatApi for MockApi {
    fn load_history(&self, room: &RoomKey) -> ApiPromise<Vec<ChatMessage>> {
        let mut state = self.state.borrow_mut();
        state.history_rooms.push(room.clone());
        Promise::from_ready(state.history.take().unwrap_or_else(|| Ok(Vec::new())))
    }

    fn send(&self, _room: &RoomKey, text: &str) -> ApiPromise<ChatMessage> {
        let mut state = self.state.borrow_mut();
        state.sent.push(text.to_owned());
        let reply = state
            .reply
            .take()
            .unwrap_or_else(|| Ok(ChatMessage::new(Role::User, text)));
        Promise::from_ready(reply)
    }
}
