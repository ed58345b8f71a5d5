use crate::Result;
use ewebsock::{WsEvent, WsMessage};
use std::fmt;
use url::Url;

pub mod backoff;
pub mod message;
pub mod queue;
pub mod websocket;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Open,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => f.write_str("disconnected"),
            ConnectionStatus::Connecting => f.write_str("connecting"),
            ConnectionStatus::Open => f.write_str("open"),
        }
    }
}

/// Inbound signals of a single duplex connection. Either an `Error` or a
/// `Closed` ends the connection; a `Closed` may or may not follow an `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Message(String),
    Closed,
    Error(String),
}

impl TransportEvent {
    /// Maps an ewebsock event, dropping frames the chat protocol has no use for.
    pub fn from_ws(event: WsEvent) -> Option<Self> {
        match event {
            WsEvent::Opened => Some(TransportEvent::Opened),
            WsEvent::Closed => Some(TransportEvent::Closed),
            WsEvent::Error(err) => Some(TransportEvent::Error(err)),
            WsEvent::Message(WsMessage::Text(text)) => Some(TransportEvent::Message(text)),
            WsEvent::Message(WsMessage::Binary(bytes)) => {
                String::from_utf8(bytes).ok().map(TransportEvent::Message)
            }
            WsEvent::Message(_) => None,
        }
    }
}

/// One open (or opening) connection to the backend.
///
/// Dropping a connection without reading its remaining events is how the
/// engine detaches from it: nothing that arrives afterwards is ever observed.
pub trait Connection {
    /// Transmit one text frame. Only valid while the connection is open.
    fn send(&mut self, frame: String);

    fn ping(&mut self) {}

    /// Best-effort close. Must not panic on an already broken connection.
    fn close(&mut self);

    /// Next inbound signal, if any, without blocking.
    fn try_recv(&mut self) -> Option<TransportEvent>;
}

/// Opens connections. One transport serves every room the session visits.
pub trait Transport {
    type Conn: Connection;

    fn connect(&mut self, url: &Url) -> Result<Self::Conn>;
}

/// Called from the network thread when a connection has something for the
/// host loop to poll.
pub trait Wakeup: Clone + Send + Sync + 'static {
    fn wake(&self);
}

impl<F> Wakeup for F
where
    F: Fn() + Clone + Send + Sync + 'static,
{
    fn wake(&self) {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_websocket_events() {
        assert_eq!(
            TransportEvent::from_ws(WsEvent::Opened),
            Some(TransportEvent::Opened)
        );
        assert_eq!(
            TransportEvent::from_ws(WsEvent::Message(WsMessage::Text("{}".to_owned()))),
            Some(TransportEvent::Message("{}".to_owned()))
        );
        assert_eq!(
            TransportEvent::from_ws(WsEvent::Message(WsMessage::Binary(b"x".to_vec()))),
            Some(TransportEvent::Message("x".to_owned()))
        );
        assert_eq!(
            TransportEvent::from_ws(WsEvent::Message(WsMessage::Pong(vec![]))),
            None
        );
        assert_eq!(
            TransportEvent::from_ws(WsEvent::Error("boom".to_owned())),
            Some(TransportEvent::Error("boom".to_owned()))
        );
    }
}
