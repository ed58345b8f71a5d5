mod api;
mod client;
mod config;
pub mod conn;
mod endpoint;
mod error;
mod identity;
mod message;
mod session;
mod state;
pub mod storage;

#[cfg(test)]
mod test_utils;

pub use api::{ApiPromise, ChatApi, HttpChatApi};
pub use client::ClientMessage;
pub use config::{ChatConfig, FallbackEcho};
pub use conn::message::{AgentInfo, Party, ServerMessage};
pub use conn::websocket::{WebsocketConn, WebsocketTransport};
pub use conn::{Connection, ConnectionStatus, Transport, TransportEvent, Wakeup};
pub use endpoint::{Endpoint, RoomKey};
pub use error::Error;
pub use ewebsock;
pub use identity::{FileIdentity, IdentityProvider, StaticIdentity};
pub use message::{new_id, ChatMessage, Content, Role};
pub use session::{build_engine, ChatEngine, LiveSession, MockSession};
pub use state::{Change, ConnectionState, SessionState, TakeoverState, TypingState};
pub use storage::{DataPath, DataPathType};

pub type Result<T> = std::result::Result<T, error::Error>;
