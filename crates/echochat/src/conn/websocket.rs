use crate::{
    conn::{Connection, Transport, TransportEvent, Wakeup},
    Error, Result,
};

use std::fmt;

use ewebsock::{Options, WsMessage, WsReceiver, WsSender};
use tracing::{debug, trace};
use url::Url;

/// A websocket to the chat backend, backed by ewebsock.
pub struct WebsocketConn {
    pub url: Url,
    sender: WsSender,
    receiver: WsReceiver,
}

impl fmt::Debug for WebsocketConn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebsocketConn")
            .field("url", &self.url.as_str())
            .finish()
    }
}

impl WebsocketConn {
    pub fn connect<W>(url: &Url, wakeup: W) -> Result<Self>
    where
        W: Wakeup,
    {
        let (sender, receiver) =
            ewebsock::connect_with_wakeup(url.as_str(), Options::default(), move || wakeup.wake())
                .map_err(|reason| Error::Connect {
                    url: url.to_string(),
                    reason,
                })?;

        Ok(Self {
            url: url.clone(),
            sender,
            receiver,
        })
    }
}

impl Connection for WebsocketConn {
    fn send(&mut self, frame: String) {
        debug!("sending {} to {}", frame, self.url);
        self.sender.send(WsMessage::Text(frame));
    }

    fn ping(&mut self) {
        trace!("pinging {}", self.url);
        self.sender.send(WsMessage::Ping(vec![]));
    }

    fn close(&mut self) {
        self.sender.close();
    }

    fn try_recv(&mut self) -> Option<TransportEvent> {
        loop {
            let event = self.receiver.try_recv()?;

            // let's just handle pongs here.
            // We only need to do this natively.
            #[cfg(not(target_arch = "wasm32"))]
            if let ewebsock::WsEvent::Message(WsMessage::Ping(ref bs)) = event {
                trace!("pong {}", &self.url);
                self.sender.send(WsMessage::Pong(bs.to_owned()));
                continue;
            }

            if let Some(event) = TransportEvent::from_ws(event) {
                return Some(event);
            }
        }
    }
}

/// Opens ewebsock connections that poke `wakeup` whenever data arrives.
#[derive(Clone)]
pub struct WebsocketTransport<W> {
    wakeup: W,
}

impl<W> WebsocketTransport<W>
where
    W: Wakeup,
{
    pub fn new(wakeup: W) -> Self {
        Self { wakeup }
    }
}

impl<W> Transport for WebsocketTransport<W>
where
    W: Wakeup,
{
    type Conn = WebsocketConn;

    fn connect(&mut self, url: &Url) -> Result<WebsocketConn> {
        WebsocketConn::connect(url, self.wakeup.clone())
    }
}
