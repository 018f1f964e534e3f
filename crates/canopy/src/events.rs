//! Server-to-browser event channel.
//!
//! Connected viewers subscribe to a long-lived SSE stream; the server pushes
//! typed events (`reload`, `programMod`, `fileMod`) whenever watched files
//! change. Frames are base64 of the JSON-encoded event so arbitrary payload
//! bytes can never break the line-oriented SSE framing.
//!
//! Delivery is best effort: a client that connects after a broadcast simply
//! misses it and re-requests full state instead. Dead connections are pruned
//! lazily, at broadcast time.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Events pushed to connected viewers.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// The viewer's own static assets changed; the page must hard-reload.
    Reload,
    /// The parser program changed; re-issue the last parse request.
    ProgramMod,
    /// A watched language file changed (path relative to the language root);
    /// re-parse only if it is the currently selected file.
    FileMod(String),
}

/// Wire shape of one event frame, before base64 encoding.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ViewerEvent {
    fn frame(&self) -> EventFrame {
        let (event_type, data) = match self {
            ViewerEvent::Reload => ("reload", None),
            ViewerEvent::ProgramMod => ("programMod", None),
            ViewerEvent::FileMod(path) => ("fileMod", Some(serde_json::Value::from(path.clone()))),
        };
        EventFrame {
            event_type: event_type.to_string(),
            data,
        }
    }

    /// Encode as the transport frame: base64 of the JSON `{type, data}`.
    pub fn encode(&self) -> String {
        let json = serde_json::to_string(&self.frame()).unwrap_or_default();
        BASE64.encode(json)
    }
}

/// Decode a transport frame back to `{type, data}`.
pub fn decode_frame(frame: &str) -> Result<EventFrame, String> {
    let bytes = BASE64.decode(frame).map_err(|e| e.to_string())?;
    serde_json::from_slice(&bytes).map_err(|e| e.to_string())
}

/// Broadcast channel over all currently connected viewers.
///
/// Each connection is an unbounded sender whose receiver side feeds one SSE
/// response stream. The sender list is only touched while holding the lock,
/// so a disconnect can never corrupt an in-progress broadcast.
#[derive(Debug, Default)]
pub struct EventChannel {
    connections: Mutex<Vec<UnboundedSender<String>>>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection and return its frame receiver. The channel
    /// never closes a connection on its own; it lives until the receiver is
    /// dropped (client disconnect).
    pub fn subscribe(&self) -> UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.lock().unwrap().push(tx);
        rx
    }

    /// Send one event to every live connection, pruning connections whose
    /// receiver is gone. Returns the number of deliveries.
    pub fn broadcast(&self, event: &ViewerEvent) -> usize {
        let frame = event.encode();
        let mut connections = self.connections.lock().unwrap();
        connections.retain(|tx| tx.send(frame.clone()).is_ok());
        connections.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().unwrap().len()
    }
}
