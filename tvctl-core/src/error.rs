//! Domain-specific error types for the remote-control client.
//!
//! Protocol failures never cross the controller boundary as `Err`; they are
//! reported once through [`RemoteEvent::Error`](crate::RemoteEvent::Error)
//! and the operation is abandoned. The only `Result` a caller sees directly
//! is [`TvError::ChannelClosed`] from a [`RemoteHandle`](crate::RemoteHandle)
//! whose controller has stopped.

use thiserror::Error;

use crate::network::TransportError;
use crate::protocol::HandshakeResponse;

/// The canonical error type for the remote-control client.
#[derive(Debug, Error)]
pub enum TvError {
    // ── Connection Errors ────────────────────────────────────────
    /// `connect()` was called while a transport already exists.
    #[error("connection already established")]
    ConnectionAlreadyEstablished,

    /// The configuration could not be composed into a valid URI.
    #[error("failed to construct connection url: {0}")]
    UrlConstructionFailed(String),

    /// The socket layer reported a failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The operation needs an open connection.
    #[error("not connected")]
    NotConnected,

    // ── Handshake Errors ─────────────────────────────────────────
    /// An inbound payload was not a handshake envelope.
    #[error("failed to parse packet: {0}")]
    PacketParsingFailed(String),

    /// The handshake carried an event this client does not understand.
    #[error("unexpected handshake event: {}", .0.event)]
    UnexpectedHandshakeEvent(Box<HandshakeResponse>),

    /// The TV allowed the connection but sent no usable session token.
    #[error("no token in handshake")]
    NoTokenInHandshake(Box<HandshakeResponse>),

    // ── Command Errors ───────────────────────────────────────────
    /// The TV has not allowed this client yet.
    #[error("not authorized")]
    NotAuthorized,

    /// A remote command could not be encoded.
    #[error("failed to serialize command: {0}")]
    CommandSerializationFailed(String),

    // ── Handle Errors ────────────────────────────────────────────
    /// The controller task is no longer running.
    #[error("channel closed")]
    ChannelClosed,
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for TvError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        TvError::ChannelClosed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for TvError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        TvError::ChannelClosed
    }
}
