//!
//! Portico push channel
//! --------------------
//! Live duplex connection carrying dashboard push messages, tied to a user
//! identity for the lifetime of a consuming view.
//!
//! Responsibilities:
//! - Exactly one connection per identity; none while the identity is absent.
//! - Inbound text frames parse as JSON and reach the consumer callback in
//!   arrival order; unparseable frames are logged and dropped.
//! - `send` serializes to JSON text and transmits only while the connection
//!   is open, reporting failure as a boolean rather than an error.
//! - Transport errors and unexpected closure are observed and logged but not
//!   retried; reconnection on identity change is the only renewal path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Push endpoint for one identity. A bare host gets `wss://`; an explicit
/// `ws://`/`wss://` value (local deployments, tests) is used as-is.
pub fn endpoint(push_host: &str, user_id: &str) -> String {
    let host = push_host.trim_end_matches('/');
    let encoded = urlencoding::encode(user_id);
    if host.starts_with("ws://") || host.starts_with("wss://") {
        format!("{}/dev?user_id={}", host, encoded)
    } else {
        format!("wss://{}/dev?user_id={}", host, encoded)
    }
}

/// One live connection. Owned exclusively; dropping it tears the transport
/// down unconditionally.
pub struct PushChannel {
    conn_id: Uuid,
    user_id: String,
    open: Arc<AtomicBool>,
    sink: Arc<Mutex<WsSink>>,
    reader: JoinHandle<()>,
}

impl PushChannel {
    /// Open a connection for `user_id` and start delivering parsed inbound
    /// frames to `on_message`, in arrival order.
    pub async fn open<F>(push_host: &str, user_id: &str, on_message: F) -> AppResult<Self>
    where
        F: Fn(Value) + Send + 'static,
    {
        let url = endpoint(push_host, user_id);
        let (stream, _resp) = connect_async(url.as_str())
            .await
            .map_err(|e| AppError::internal("push_connect_failed", format!("connect to {} failed: {}", url, e)))?;
        let (sink, mut source) = stream.split();

        let conn_id = Uuid::new_v4();
        let open = Arc::new(AtomicBool::new(true));
        let reader_open = open.clone();
        let reader = tokio::spawn(async move {
            while let Some(next) = source.next().await {
                match next {
                    Ok(Message::Text(text)) => match serde_json::from_str::<Value>(&text) {
                        Ok(payload) => on_message(payload),
                        Err(e) => warn!(target: "push", "conn {} dropping unparseable frame: {e}", conn_id),
                    },
                    Ok(Message::Close(_)) => {
                        info!(target: "push", "conn {} closed by peer", conn_id);
                        break;
                    }
                    Ok(_) => {} // binary/ping/pong: nothing for the consumer
                    Err(e) => {
                        warn!(target: "push", "conn {} transport error: {e}", conn_id);
                        break;
                    }
                }
            }
            reader_open.store(false, Ordering::SeqCst);
        });

        info!(target: "push", "conn {} open for user {}", conn_id, user_id);
        Ok(Self {
            conn_id,
            user_id: user_id.to_string(),
            open,
            sink: Arc::new(Mutex::new(sink)),
            reader,
        })
    }

    pub fn user_id(&self) -> &str { &self.user_id }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Serialize `payload` to JSON text and transmit it. Returns false,
    /// transmitting nothing, when the connection is not currently open or
    /// the write fails.
    pub async fn send(&self, payload: &Value) -> bool {
        if !self.is_open() {
            return false;
        }
        let text = payload.to_string();
        let mut sink = self.sink.lock().await;
        match sink.send(Message::Text(text)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(target: "push", "conn {} send failed: {e}", self.conn_id);
                self.open.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    /// Close the connection and stop delivery. Idempotent.
    pub async fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            let mut sink = self.sink.lock().await;
            let _ = sink.send(Message::Close(None)).await;
            info!(target: "push", "conn {} closed", self.conn_id);
        }
        self.reader.abort();
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        // Unconditional teardown; the async close is preferred but a plain
        // drop must still stop delivery.
        self.open.store(false, Ordering::SeqCst);
        self.reader.abort();
    }
}

/// Hook-shaped owner tying a connection to the consumer's current identity.
/// Identity change closes the old connection before opening the new one;
/// clearing the identity (or dropping the hook) closes without replacement.
pub struct PushHook {
    push_host: String,
    handler: Arc<dyn Fn(Value) + Send + Sync>,
    channel: Option<PushChannel>,
}

impl PushHook {
    pub fn new<F>(push_host: &str, on_message: F) -> Self
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        Self { push_host: push_host.to_string(), handler: Arc::new(on_message), channel: None }
    }

    pub fn channel(&self) -> Option<&PushChannel> { self.channel.as_ref() }

    /// Follow the consumer's identity. No identity means no connection; an
    /// unchanged identity is a no-op; a new identity replaces the connection,
    /// old one closed first.
    pub async fn set_identity(&mut self, user_id: Option<&str>) -> AppResult<()> {
        if let (Some(current), Some(next)) = (&self.channel, user_id) {
            if current.user_id() == next {
                return Ok(());
            }
        }
        if let Some(old) = self.channel.take() {
            old.close().await;
        }
        let Some(next) = user_id else { return Ok(()); };
        let handler = self.handler.clone();
        let channel = PushChannel::open(&self.push_host, next, move |payload| handler(payload)).await?;
        self.channel = Some(channel);
        Ok(())
    }

    /// Send through the current connection, if any.
    pub async fn send(&self, payload: &Value) -> bool {
        match &self.channel {
            Some(channel) => channel.send(payload).await,
            None => false,
        }
    }

    /// Close and forget the current connection.
    pub async fn shutdown(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close().await;
        }
    }
}
