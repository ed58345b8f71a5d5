use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use hashbrown::HashSet;
use tracing::{debug, error, info, warn};

use crate::{
    api::{ApiPromise, ChatApi},
    conn::{backoff::Backoff, queue::OutboundQueue, Connection, TransportEvent},
    identity::IdentityProvider,
    message::new_id,
    session::{store::StateStore, ChatEngine},
    state::Change,
    ChatConfig, ChatMessage, ClientMessage, ConnectionStatus, Content, Endpoint, FallbackEcho,
    Result, Role, RoomKey, SessionState, Transport,
};

struct ScheduledReconnect {
    at: Instant,
    room: RoomKey,
}

struct FallbackSend {
    client_id: String,
    promise: ApiPromise<ChatMessage>,
}

/// The realtime session engine.
///
/// Owns at most one connection. While the session is wanted (between
/// `connect_ws` and `disconnect_ws`) every close schedules a reconnect with
/// capped exponential backoff, and sends are queued until the next open.
pub struct LiveSession<T: Transport> {
    store: StateStore,
    transport: T,
    conn: Option<T::Conn>,
    api: Box<dyn ChatApi>,
    identity: Box<dyn IdentityProvider>,
    endpoint: Endpoint,

    room: Option<RoomKey>,
    wanted: bool,
    queue: OutboundQueue,
    pub(super) pending: HashSet<String>,
    backoff: Backoff,
    reconnect: Option<ScheduledReconnect>,

    keepalive: Option<Duration>,
    last_ping: Instant,
    fallback_echo: FallbackEcho,

    history: Option<ApiPromise<Vec<ChatMessage>>>,
    fallback_sends: Vec<FallbackSend>,
}

impl<T: Transport> LiveSession<T> {
    pub fn new(
        config: &ChatConfig,
        transport: T,
        api: Box<dyn ChatApi>,
        identity: Box<dyn IdentityProvider>,
    ) -> Self {
        Self {
            store: StateStore::default(),
            transport,
            conn: None,
            api,
            identity,
            endpoint: config.endpoint(),
            room: None,
            wanted: false,
            queue: OutboundQueue::default(),
            pending: HashSet::new(),
            backoff: Backoff::default(),
            reconnect: None,
            keepalive: config.keepalive,
            last_ping: Instant::now(),
            fallback_echo: config.fallback_echo,
            history: None,
            fallback_sends: Vec::new(),
        }
    }

    pub fn room(&self) -> Option<&RoomKey> {
        self.room.as_ref()
    }

    /// Client ids sent over the wire and not yet acknowledged.
    pub fn pending(&self) -> &HashSet<String> {
        &self.pending
    }

    pub fn queue(&self) -> &OutboundQueue {
        &self.queue
    }

    pub fn has_transport(&self) -> bool {
        self.conn.is_some()
    }

    /// When the next reconnect fires, if one is scheduled.
    pub fn reconnect_at(&self) -> Option<Instant> {
        self.reconnect.as_ref().map(|r| r.at)
    }

    fn is_open(&self) -> bool {
        self.conn.is_some() && self.store.state().connected()
    }

    pub(super) fn store_mut(&mut self) -> &mut StateStore {
        &mut self.store
    }

    fn open_conn(&mut self) {
        let Some(room) = self.room.clone() else {
            return;
        };

        match self.connect(&room) {
            Ok(conn) => {
                self.conn = Some(conn);
                self.store.set_status(ConnectionStatus::Connecting);
            }
            Err(err) => {
                // the next poll schedules a retry
                error!("error connecting to chat backend: {err}");
                self.store.set_status(ConnectionStatus::Disconnected);
            }
        }
    }

    fn connect(&mut self, room: &RoomKey) -> Result<T::Conn> {
        let url = self.endpoint.ws_url(room)?;
        info!("connecting to {url}");
        self.transport.connect(&url)
    }

    /// Drops the current connection. Its remaining events are never read.
    fn retire_conn(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            conn.close();
        }
    }

    fn send_ws(&mut self, frame: ClientMessage) {
        if self.is_open() {
            self.transmit(frame);
        } else {
            debug!("queueing {:?} until the connection opens", frame);
            self.queue.push(frame);
        }
    }

    /// Puts a frame on the wire, applying the bookkeeping a sent message
    /// carries: its id becomes pending and the sender stops typing.
    fn transmit(&mut self, frame: ClientMessage) {
        if let Some(id) = frame.client_id() {
            // a message cleared away while queued has nothing left to reconcile
            if self.store.has_message(id) {
                self.pending.insert(id.to_owned());
            }
            self.store.set_typing(false);
        }

        let json = match frame.to_json() {
            Ok(json) => json,
            Err(e) => {
                error!("error serializing {:?}: {e}", frame);
                return;
            }
        };

        if let Some(conn) = self.conn.as_mut() {
            conn.send(json);
        }
    }

    #[profiling::function]
    fn flush_queue(&mut self) {
        if self.queue.is_empty() {
            return;
        }

        let batch = self.queue.take();
        info!("flushing {} queued frames", batch.len());
        for frame in batch {
            self.transmit(frame);
        }
    }

    fn fallback_send(&mut self, client_id: String, text: &str) {
        let Some(room) = &self.room else {
            return;
        };

        self.store.set_typing(true);
        let promise = self.api.send(room, text);
        self.fallback_sends.push(FallbackSend { client_id, promise });
    }

    fn on_open(&mut self, now: Instant) {
        info!("chat connection open");
        self.store.set_status(ConnectionStatus::Open);
        self.backoff.reset();
        self.store.set_reconnect_attempt(0);
        self.last_ping = now;
        self.flush_queue();
    }

    fn on_close(&mut self, now: Instant) {
        info!("chat connection closed");
        self.conn = None;
        self.store.set_status(ConnectionStatus::Disconnected);
        // the server no longer vouches for anyone typing
        self.store.clear_remote_typing();

        if self.wanted {
            self.schedule_reconnect(now);
        }
    }

    fn schedule_reconnect(&mut self, now: Instant) {
        let Some(room) = self.room.clone() else {
            return;
        };

        let delay = self.backoff.next_delay();
        self.store.set_reconnect_attempt(self.backoff.attempt());
        info!(
            "reconnecting to {} in {:?} (attempt {})",
            room.bot_id,
            delay,
            self.backoff.attempt()
        );
        self.reconnect = Some(ScheduledReconnect {
            at: now + delay,
            room,
        });
    }

    #[profiling::function]
    fn recv_events(&mut self, now: Instant) {
        loop {
            let Some(conn) = self.conn.as_mut() else {
                return;
            };
            let Some(event) = conn.try_recv() else {
                return;
            };

            match event {
                TransportEvent::Opened => self.on_open(now),
                TransportEvent::Message(text) => self.handle_frame(&text),
                TransportEvent::Error(err) => {
                    // ewebsock does not always follow an error with a close
                    warn!("chat connection error: {err}");
                    self.retire_conn();
                    self.on_close(now);
                }
                TransportEvent::Closed => self.on_close(now),
            }
        }
    }

    fn check_reconnect(&mut self, now: Instant) {
        let due = matches!(&self.reconnect, Some(r) if now >= r.at);
        if due {
            if let Some(scheduled) = self.reconnect.take() {
                if self.wanted && self.room.as_ref() == Some(&scheduled.room) {
                    self.retire_conn();
                    self.open_conn();
                } else {
                    debug!("dropping stale reconnect for {}", scheduled.room.bot_id);
                }
            }
        }

        // a connect that failed outright never produces a close
        if self.wanted && self.conn.is_none() && self.reconnect.is_none() {
            self.schedule_reconnect(now);
        }
    }

    fn keepalive_ping(&mut self, now: Instant) {
        let Some(rate) = self.keepalive else {
            return;
        };
        if !self.is_open() || now.saturating_duration_since(self.last_ping) < rate {
            return;
        }

        if let Some(conn) = self.conn.as_mut() {
            conn.ping();
            self.last_ping = now;
        }
    }

    #[profiling::function]
    fn poll_requests(&mut self) {
        if let Some(promise) = self.history.take() {
            match promise.try_take() {
                Ok(Ok(messages)) => {
                    info!("loaded {} history messages", messages.len());
                    self.replace_history(messages);
                }
                Ok(Err(err)) => {
                    warn!("history load failed, starting empty: {err}");
                    self.replace_history(Vec::new());
                }
                Err(promise) => self.history = Some(promise),
            }
        }

        if self.fallback_sends.is_empty() {
            return;
        }

        for send in std::mem::take(&mut self.fallback_sends) {
            match send.promise.try_take() {
                Ok(result) => self.finish_fallback(&send.client_id, result),
                Err(promise) => self.fallback_sends.push(FallbackSend {
                    client_id: send.client_id,
                    promise,
                }),
            }
        }
    }

    fn finish_fallback(&mut self, client_id: &str, result: Result<ChatMessage>) {
        match result {
            Ok(canonical) => {
                let replaced = self.fallback_echo == FallbackEcho::Replace
                    && canonical.role == Role::User
                    && self.store.replace_message(client_id, canonical.clone());
                if !replaced {
                    self.store.push_message(canonical);
                }
            }
            Err(err) => {
                warn!("fallback send failed, rolling back {client_id}: {err}");
                self.store.remove_message(client_id);
            }
        }

        self.store.set_typing(false);
    }

    /// Replaces the conversation, dropping pending ids whose message is gone.
    pub(super) fn replace_history(&mut self, messages: Vec<ChatMessage>) {
        self.store.replace_messages(messages);
        let store = &self.store;
        self.pending.retain(|id| store.has_message(id));
    }
}

impl<T: Transport> ChatEngine for LiveSession<T> {
    fn state(&self) -> &SessionState {
        self.store.state()
    }

    fn subscribe(&mut self) -> Receiver<Change> {
        self.store.subscribe()
    }

    fn load_history(&mut self, bot_id: &str) {
        let room = RoomKey::new(bot_id, self.identity.id());
        if self.room.is_none() {
            self.room = Some(room.clone());
        }

        self.history = Some(self.api.load_history(&room));
    }

    fn connect_ws(&mut self, bot_id: &str) {
        let room = RoomKey::new(bot_id, self.identity.id());

        if let Some(old) = &self.room {
            if *old != room {
                info!("switching chat room {} -> {}", old.bot_id, room.bot_id);
                // queued, pending and in-flight work belongs to the old room
                self.queue.clear();
                self.pending.clear();
                self.history = None;
                self.fallback_sends.clear();
                self.store.set_typing(false);
                self.backoff.reset();
                self.store.set_reconnect_attempt(0);
            }
        }

        self.retire_conn();
        self.reconnect = None;
        self.room = Some(room);
        self.wanted = true;
        self.open_conn();
    }

    fn disconnect_ws(&mut self) {
        self.wanted = false;
        self.reconnect = None;
        self.retire_conn();
        self.store.set_status(ConnectionStatus::Disconnected);
    }

    fn send_message(&mut self, text: &str) -> String {
        let id = new_id();
        self.store
            .push_message(ChatMessage::with_id(id.clone(), Role::User, text));

        let frame = ClientMessage::msg(text, id.clone());
        if self.is_open() {
            self.transmit(frame);
        } else if self.wanted || self.room.is_none() {
            debug!("queueing message {id} until the connection opens");
            self.queue.push(frame);
        } else {
            self.fallback_send(id.clone(), text);
        }

        id
    }

    fn set_typing(&mut self, typing: bool) {
        self.store.set_typing(typing);
        if self.wanted {
            self.send_ws(ClientMessage::typing(typing));
        }
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
        self.pending.clear();
        self.stop_typing();
    }

    #[profiling::function]
    fn poll(&mut self, now: Instant) {
        self.recv_events(now);
        self.check_reconnect(now);
        self.keepalive_ping(now);
        self.poll_requests();
    }
}

impl<T: Transport> Drop for LiveSession<T> {
    fn drop(&mut self) {
        self.disconnect_ws();
    }
}
