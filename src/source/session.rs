//! Persistent WebSocket session to the element.
//!
//! Inbound frames are delivered in receipt order as [`SessionEvent`]s on a
//! channel that outlives individual connections, so the consumer keeps a
//! single stream across reconnects. The session never reconnects on its
//! own; that policy belongs to the poll driver.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::MonitorError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, Message>;

/// Something the receive path observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// One inbound text frame.
    Message(String),
    /// The element closed the connection or the stream ended.
    Closed,
    /// The connection failed while reading.
    Error(String),
}

/// A WebSocket connection to the element that can be reopened.
pub struct WsSession {
    url: String,
    events: mpsc::Sender<SessionEvent>,
    writer: Mutex<Option<WsWriter>>,
    connected: Arc<AtomicBool>,
    /// Bumped on every connect so a stale read loop cannot clear the
    /// connected flag of a newer connection.
    generation: Arc<AtomicU64>,
}

impl WsSession {
    /// Create a session that reports to `events`.
    pub fn new(url: impl Into<String>, events: mpsc::Sender<SessionEvent>) -> Self {
        Self {
            url: url.into(),
            events,
            writer: Mutex::new(None),
            connected: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a session together with the receiving end of its event channel.
    pub fn channel(url: impl Into<String>, buffer: usize) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(url, tx), rx)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the last connection is still open. Lock-free; may lag the
    /// transport by one event.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Open the connection and start the receive loop.
    pub async fn connect(&self) -> Result<(), MonitorError> {
        debug!("Connecting to {}", self.url);

        let (ws_stream, _) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| MonitorError::Connection(format!("{}: {}", self.url, e)))?;

        let (write, read) = ws_stream.split();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;

        *self.writer.lock().await = Some(write);
        self.connected.store(true, Ordering::Release);
        info!("Connected to {}", self.url);

        tokio::spawn(read_loop(
            read,
            self.events.clone(),
            self.connected.clone(),
            self.generation.clone(),
            generation,
        ));

        Ok(())
    }

    /// Send a text frame. Fails with [`MonitorError::Send`] when not connected;
    /// nothing is queued.
    pub async fn send_text(&self, text: &str) -> Result<(), MonitorError> {
        if !self.is_connected() {
            return Err(MonitorError::Send("session is not connected".to_string()));
        }

        let mut writer = self.writer.lock().await;
        let Some(write) = writer.as_mut() else {
            return Err(MonitorError::Send("session is not connected".to_string()));
        };

        if let Err(e) = write.send(Message::text(text.to_owned())).await {
            self.connected.store(false, Ordering::Release);
            return Err(MonitorError::Send(e.to_string()));
        }
        Ok(())
    }

    /// Serialize `data` as JSON and send it.
    pub async fn send_json<T: Serialize>(&self, data: &T) -> Result<(), MonitorError> {
        let json = serde_json::to_string(data).map_err(|e| MonitorError::Send(e.to_string()))?;
        self.send_text(&json).await
    }

    /// Close the connection. Closing a session that is not open is a no-op.
    pub async fn close(&self) -> Result<(), MonitorError> {
        self.connected.store(false, Ordering::Release);

        let Some(mut write) = self.writer.lock().await.take() else {
            return Ok(());
        };

        debug!("Closing connection to {}", self.url);
        write.send(Message::Close(None)).await.map_err(MonitorError::from)
    }
}

impl std::fmt::Debug for WsSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsSession")
            .field("url", &self.url)
            .field("connected", &self.is_connected())
            .finish()
    }
}

async fn read_loop(
    mut read: SplitStream<WsStream>,
    tx: mpsc::Sender<SessionEvent>,
    connected: Arc<AtomicBool>,
    current_generation: Arc<AtomicU64>,
    generation: u64,
) {
    let end = loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => {
                if tx.send(SessionEvent::Message(text.to_string())).await.is_err() {
                    break None;
                }
            }
            Some(Ok(Message::Binary(data))) => {
                let event = match String::from_utf8(data.to_vec()) {
                    Ok(text) => SessionEvent::Message(text),
                    Err(e) => SessionEvent::Error(format!("non UTF-8 binary frame: {}", e)),
                };
                if tx.send(event).await.is_err() {
                    break None;
                }
            }
            Some(Ok(Message::Close(_))) | None => break Some(SessionEvent::Closed),
            // Ping/Pong are answered by tungstenite
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!("WebSocket receive error: {}", e);
                break Some(SessionEvent::Error(e.to_string()));
            }
        }
    };

    if current_generation.load(Ordering::Acquire) == generation {
        connected.store(false, Ordering::Release);
    }
    if let Some(event) = end {
        let _ = tx.send(event).await;
    }
    debug!("WebSocket receive loop finished");
}
