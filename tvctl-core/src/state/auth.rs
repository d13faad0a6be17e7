//! Handshake resolution.
//!
//! Turns a decoded [`HandshakeResponse`] into the authorization status it
//! implies and, for an accepted client, the session token to adopt.

use std::fmt;

use crate::error::TvError;
use crate::protocol::{HandshakeEvent, HandshakeResponse};

// ── AuthorizationStatus ──────────────────────────────────────────

/// Whether the TV lets this client send keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthorizationStatus {
    /// No verdict yet, or the pairing prompt timed out.
    #[default]
    None,
    Allowed,
    Denied,
}

impl fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Allowed => write!(f, "Allowed"),
            Self::Denied => write!(f, "Denied"),
        }
    }
}

// ── TokenSource ──────────────────────────────────────────────────

/// Where the session token of an accepted handshake came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// `data.token`.
    Direct(String),
    /// The first paired client whose name matches ours.
    PairedClient(String),
    /// Neither place had one.
    Missing,
}

impl TokenSource {
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Direct(t) | Self::PairedClient(t) => Some(t),
            Self::Missing => None,
        }
    }
}

/// Pick the session token out of an accepted handshake.
///
/// Order matters: a direct token always wins over the paired-client
/// list, and only the first client whose name equals `encoded_app_name`
/// is considered. Empty tokens count as absent.
pub fn resolve_token(response: &HandshakeResponse, encoded_app_name: &str) -> TokenSource {
    if let Some(token) = response.direct_token().filter(|t| !t.is_empty()) {
        return TokenSource::Direct(token.to_string());
    }

    response
        .clients()
        .iter()
        .find(|c| c.attributes.name.as_deref() == Some(encoded_app_name))
        .and_then(|c| c.attributes.token.as_deref())
        .filter(|t| !t.is_empty())
        .map(|t| TokenSource::PairedClient(t.to_string()))
        .unwrap_or(TokenSource::Missing)
}

// ── HandshakeOutcome ─────────────────────────────────────────────

/// The verdict carried by a recognised handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
    Allowed(TokenSource),
    Denied,
    /// The pairing prompt expired; treated as "no verdict", not a denial.
    TimedOut,
}

impl HandshakeOutcome {
    /// The authorization status this outcome leaves the session in.
    pub fn status(&self) -> AuthorizationStatus {
        match self {
            Self::Allowed(_) => AuthorizationStatus::Allowed,
            Self::Denied => AuthorizationStatus::Denied,
            Self::TimedOut => AuthorizationStatus::None,
        }
    }
}

/// Interpret a handshake packet.
///
/// Unknown events yield [`TvError::UnexpectedHandshakeEvent`] and must
/// leave the authorization status untouched.
pub fn resolve_handshake(
    response: &HandshakeResponse,
    encoded_app_name: &str,
) -> Result<HandshakeOutcome, TvError> {
    match &response.event {
        HandshakeEvent::Connect => Ok(HandshakeOutcome::Allowed(resolve_token(
            response,
            encoded_app_name,
        ))),
        HandshakeEvent::Unauthorized => Ok(HandshakeOutcome::Denied),
        HandshakeEvent::Timeout => Ok(HandshakeOutcome::TimedOut),
        HandshakeEvent::Other(_) => Err(TvError::UnexpectedHandshakeEvent(Box::new(
            response.clone(),
        ))),
    }
}

// ── Tests ────────────────────────────────────────────────────────
