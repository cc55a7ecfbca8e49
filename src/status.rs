// src/status.rs
//! Typed status events
//!
//! Every connection transition and failure emits one `(kind, detail)` event
//! on a channel. The detail string is human-readable; consumers that need to
//! branch do it on the kind, never by pattern-matching the text.

use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Connected,
    ConnectFailed,
    Disconnected,
    Reconnecting,
    Reconnected,
    ReconnectFailed,
    Refreshing,
    ReadError,
    SettingsApplied,
}

#[derive(Debug, Clone)]
pub struct StatusEvent {
    pub kind: StatusKind,
    pub detail: String,
}

/// Clonable emitter handed to every component that reports status.
/// A disabled sender (or one whose receiver is gone) drops events silently.
#[derive(Clone, Default)]
pub struct StatusSender {
    tx: Option<mpsc::UnboundedSender<StatusEvent>>,
}

impl StatusSender {
    /// Sender that discards everything; used by tests and headless setups.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, kind: StatusKind, detail: impl Into<String>) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(StatusEvent {
                kind,
                detail: detail.into(),
            });
        }
    }
}

/// Create a status channel pair.
pub fn status_channel() -> (StatusSender, mpsc::UnboundedReceiver<StatusEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (StatusSender { tx: Some(tx) }, rx)
}
