//! The socket seam between the controller and the wire.
//!
//! A [`Transport`] owns one connection attempt. It never blocks the
//! caller: `connect`, `disconnect` and `write` start work and report the
//! outcome later, either through the [`TransportEventSender`] it was
//! created with or through a write's [`WriteCallback`].

use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

use crate::config::TrustPolicy;

// ── TransportError ───────────────────────────────────────────────

/// Failures raised by the socket layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The WebSocket handshake or a frame operation failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The TLS client configuration could not be built.
    #[error("tls error: {0}")]
    Tls(#[from] rustls::Error),

    /// The underlying socket reported an I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A write was requested before the socket was up or after it closed.
    #[error("transport is not connected")]
    NotConnected,

    /// The peer closed the connection.
    #[error("connection closed")]
    Closed,
}

// ── Events ───────────────────────────────────────────────────────

/// Everything a transport reports to its owner.
#[derive(Debug)]
pub enum TransportEvent {
    /// The socket is open.
    Connected,
    /// The peer closed the socket or the connection failed.
    Disconnected,
    /// The socket was torn down because the owner asked for it.
    Cancelled,
    /// A text frame arrived.
    Text(String),
    /// A binary frame arrived.
    Binary(Bytes),
    /// A non-fatal or fatal socket error. Fatal errors are followed by
    /// [`TransportEvent::Disconnected`].
    Error(TransportError),
}

/// Tags every event with the connection attempt that produced it so the
/// owner can drop events from a transport it already released.
#[derive(Debug, Clone)]
pub struct TransportEventSender {
    generation: u64,
    tx: mpsc::UnboundedSender<(u64, TransportEvent)>,
}

impl TransportEventSender {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<(u64, TransportEvent)>) -> Self {
        Self { generation, tx }
    }

    /// The connection attempt these events belong to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Deliver an event. Returns `false` once the owner has gone away.
    pub fn send(&self, event: TransportEvent) -> bool {
        self.tx.send((self.generation, event)).is_ok()
    }
}

/// Invoked exactly once when the transport has finished (or failed) a write.
pub type WriteCallback = Box<dyn FnOnce(Result<(), TransportError>) + Send + 'static>;

// ── Traits ───────────────────────────────────────────────────────

/// One socket connection, exclusively owned by the controller.
pub trait Transport: Send + 'static {
    /// Start opening the socket. Reports `Connected`, or `Error` followed
    /// by `Disconnected`.
    fn connect(&mut self);

    /// Start tearing the socket down. Reports `Cancelled`.
    fn disconnect(&mut self);

    /// Queue a text frame. `on_complete` fires after the frame has been
    /// handed to the socket, or with an error if it could not be.
    fn write(&mut self, text: String, on_complete: WriteCallback);
}

/// Creates a fresh [`Transport`] for every connection attempt.
pub trait TransportFactory: Send + 'static {
    type Transport: Transport;

    fn create(
        &mut self,
        url: Url,
        trust: TrustPolicy,
        events: TransportEventSender,
    ) -> Self::Transport;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_tags_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sender = TransportEventSender::new(7, tx);
        assert!(sender.send(TransportEvent::Connected));

        let (generation, event) = rx.try_recv().unwrap();
        assert_eq!(generation, 7);
        assert!(matches!(event, TransportEvent::Connected));
    }

    #[test]
    fn sender_reports_closed_owner() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let sender = TransportEventSender::new(1, tx);
        assert!(!sender.send(TransportEvent::Cancelled));
    }

    #[test]
    fn error_display() {
        assert_eq!(
            TransportError::NotConnected.to_string(),
            "transport is not connected"
        );
    }
}
