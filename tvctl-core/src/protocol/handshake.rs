//! Inbound handshake envelope.
//!
//! The TV answers a new connection with a single JSON packet:
//!
//! ```text
//! { "event": "ms.channel.connect",
//!   "data":  { "token": "...",
//!              "clients": [ { "attributes": { "name": "...", "token": "..." } } ] } }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

// ── HandshakeEvent ───────────────────────────────────────────────

/// Discriminant of a handshake packet.
///
/// Unknown strings are kept in [`HandshakeEvent::Other`] instead of
/// failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HandshakeEvent {
    /// The TV accepted the client.
    Connect,
    /// The user (or the TV) rejected the client.
    Unauthorized,
    /// Nobody answered the pairing prompt in time.
    Timeout,
    /// Any other event name.
    Other(String),
}

impl HandshakeEvent {
    pub const CONNECT: &'static str = "ms.channel.connect";
    pub const UNAUTHORIZED: &'static str = "ms.channel.unauthorized";
    pub const TIMEOUT: &'static str = "ms.channel.timeOut";

    /// Wire name of this event.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Connect => Self::CONNECT,
            Self::Unauthorized => Self::UNAUTHORIZED,
            Self::Timeout => Self::TIMEOUT,
            Self::Other(name) => name,
        }
    }
}

impl From<String> for HandshakeEvent {
    fn from(value: String) -> Self {
        match value.as_str() {
            Self::CONNECT => Self::Connect,
            Self::UNAUTHORIZED => Self::Unauthorized,
            Self::TIMEOUT => Self::Timeout,
            _ => Self::Other(value),
        }
    }
}

impl From<HandshakeEvent> for String {
    fn from(value: HandshakeEvent) -> Self {
        match value {
            HandshakeEvent::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for HandshakeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Payload ──────────────────────────────────────────────────────

/// Attributes a paired client was registered with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientAttributes {
    /// Base64-encoded application name.
    pub name: Option<String>,
    /// Token issued to that client.
    pub token: Option<String>,
}

/// A previously authorized application known to the TV.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairedClient {
    pub attributes: ClientAttributes,
}

impl PairedClient {
    pub fn new(name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            attributes: ClientAttributes {
                name: Some(name.into()),
                token: Some(token.into()),
            },
        }
    }
}

/// `data` member of a handshake packet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandshakeData {
    /// Token issued directly to this connection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Paired clients, in the order the TV listed them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<PairedClient>>,
}

// ── HandshakeResponse ────────────────────────────────────────────

/// A decoded handshake packet. Consumed once by the auth resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeResponse {
    pub event: HandshakeEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<HandshakeData>,
}

impl HandshakeResponse {
    /// Token carried directly in `data.token`.
    pub fn direct_token(&self) -> Option<&str> {
        self.data.as_ref()?.token.as_deref()
    }

    /// Paired clients listed in `data.clients`, empty when absent.
    pub fn clients(&self) -> &[PairedClient] {
        self.data
            .as_ref()
            .and_then(|d| d.clients.as_deref())
            .unwrap_or(&[])
    }
}

// ── Tests ────────────────────────────────────────────────────────
