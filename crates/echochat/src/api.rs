//! Plain request/response calls used for first paint and as the fallback
//! send path when no realtime channel is wanted.

use poll_promise::Promise;
use serde::de::DeserializeOwned;
use serde_derive::Serialize;
use tracing::debug;

use crate::{ChatMessage, Endpoint, Error, Result, RoomKey};

pub type ApiPromise<T> = Promise<Result<T>>;

pub trait ChatApi {
    /// `GET history?botId&anonId -> ChatMessage[]`
    fn load_history(&self, room: &RoomKey) -> ApiPromise<Vec<ChatMessage>>;

    /// `POST send {botId, anonId, text} -> ChatMessage`
    fn send(&self, room: &RoomKey, text: &str) -> ApiPromise<ChatMessage>;
}

#[derive(Serialize)]
struct SendRequest<'a> {
    #[serde(rename = "botId")]
    bot_id: &'a str,
    #[serde(rename = "anonId")]
    anon_id: &'a str,
    text: &'a str,
}

/// ChatApi over HTTP, backed by ehttp.
#[derive(Debug, Clone)]
pub struct HttpChatApi {
    endpoint: Endpoint,
}

impl HttpChatApi {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

impl ChatApi for HttpChatApi {
    fn load_history(&self, room: &RoomKey) -> ApiPromise<Vec<ChatMessage>> {
        let url = match self.endpoint.history_url(room) {
            Ok(url) => url,
            Err(e) => return Promise::from_ready(Err(e)),
        };

        debug!("fetching history from {url}");
        fetch_json(ehttp::Request::get(url))
    }

    fn send(&self, room: &RoomKey, text: &str) -> ApiPromise<ChatMessage> {
        let url = match self.endpoint.api_url("send") {
            Ok(url) => url,
            Err(e) => return Promise::from_ready(Err(e)),
        };

        let body = SendRequest {
            bot_id: &room.bot_id,
            anon_id: &room.anon_id,
            text,
        };
        let body = match serde_json::to_vec(&body) {
            Ok(body) => body,
            Err(e) => return Promise::from_ready(Err(e.into())),
        };

        let mut request = ehttp::Request::post(url, body);
        request.headers.insert("Content-Type", "application/json");

        debug!("posting fallback send to {}", request.url);
        fetch_json(request)
    }
}

fn fetch_json<T>(request: ehttp::Request) -> ApiPromise<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let (sender, promise) = Promise::new();

    let on_done = move |response: std::result::Result<ehttp::Response, String>| {
        let handle = response.map_err(Error::Http).and_then(|resp| {
            if !resp.ok {
                return Err(Error::Http(format!(
                    "bad http response: {} {}",
                    resp.status, resp.status_text
                )));
            }

            Ok(serde_json::from_slice(&resp.bytes)?)
        });

        sender.send(handle);
    };

    ehttp::fetch(request, on_done);
    promise
}
