//! Connection + authorization state of one controller.
//!
//! The state is a `connected` flag plus an [`AuthorizationStatus`]. The
//! combined [`ConnectionState`] is derived, never stored:
//!
//! ```text
//!  Disconnected ──connected──► Connected(None) ──handshake──► Connected(Allowed | Denied)
//!       ▲                            │                                │
//!       └──── disconnected ──────────┴────────────────────────────────┘
//! ```
//!
//! Authorization can only be set while connected, and every disconnect
//! clears it first.

use std::fmt;

use crate::error::TvError;
use crate::state::auth::{AuthorizationStatus, HandshakeOutcome};

// ── ConnectionState ──────────────────────────────────────────────

/// Derived view over `connected` + [`AuthorizationStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    ConnectedUnauthenticated,
    ConnectedAllowed,
    ConnectedDenied,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::ConnectedUnauthenticated => write!(f, "Connected (unauthenticated)"),
            Self::ConnectedAllowed => write!(f, "Connected (allowed)"),
            Self::ConnectedDenied => write!(f, "Connected (denied)"),
        }
    }
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}

// ── SessionState ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    connected: bool,
    authorization: AuthorizationStatus,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn authorization(&self) -> AuthorizationStatus {
        self.authorization
    }

    pub fn state(&self) -> ConnectionState {
        match (self.connected, self.authorization) {
            (false, _) => ConnectionState::Disconnected,
            (true, AuthorizationStatus::None) => ConnectionState::ConnectedUnauthenticated,
            (true, AuthorizationStatus::Allowed) => ConnectionState::ConnectedAllowed,
            (true, AuthorizationStatus::Denied) => ConnectionState::ConnectedDenied,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// The socket came up. Authorization is left as it is (always `None`
    /// on a fresh connection).
    pub fn mark_connected(&mut self) {
        self.connected = true;
    }

    /// The socket went away. Clears authorization unconditionally.
    pub fn mark_disconnected(&mut self) {
        self.authorization = AuthorizationStatus::None;
        self.connected = false;
    }

    /// Apply a handshake verdict.
    ///
    /// Valid only while connected; otherwise nothing changes and
    /// [`TvError::NotConnected`] is returned.
    pub fn apply(&mut self, outcome: &HandshakeOutcome) -> Result<AuthorizationStatus, TvError> {
        if !self.connected {
            return Err(TvError::NotConnected);
        }
        self.authorization = outcome.status();
        Ok(self.authorization)
    }

    /// Preconditions for sending a key, checked in order.
    pub fn check_can_send(&self) -> Result<(), TvError> {
        if !self.connected {
            return Err(TvError::NotConnected);
        }
        if self.authorization != AuthorizationStatus::Allowed {
            return Err(TvError::NotAuthorized);
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::auth::TokenSource;

    fn allowed() -> HandshakeOutcome {
        HandshakeOutcome::Allowed(TokenSource::Missing)
    }

    #[test]
    fn happy_path_lifecycle() {
        let mut session = SessionState::new();
        assert_eq!(session.state(), ConnectionState::Disconnected);

        session.mark_connected();
        assert_eq!(session.state(), ConnectionState::ConnectedUnauthenticated);

        session.apply(&allowed()).unwrap();
        assert_eq!(session.state(), ConnectionState::ConnectedAllowed);
        assert!(session.check_can_send().is_ok());

        session.mark_disconnected();
        assert_eq!(session.state(), ConnectionState::Disconnected);
        assert_eq!(session.authorization(), AuthorizationStatus::None);
    }

    #[test]
    fn handshake_while_disconnected_is_rejected() {
        let mut session = SessionState::new();
        assert!(matches!(
            session.apply(&allowed()),
            Err(TvError::NotConnected)
        ));
        assert_eq!(session.authorization(), AuthorizationStatus::None);
    }

    #[test]
    fn disconnect_clears_any_status() {
        for outcome in [allowed(), HandshakeOutcome::Denied, HandshakeOutcome::TimedOut] {
            let mut session = SessionState::new();
            session.mark_connected();
            session.apply(&outcome).unwrap();
            session.mark_disconnected();
            assert!(!session.is_connected());
            assert_eq!(session.authorization(), AuthorizationStatus::None);
        }
    }

    #[test]
    fn timeout_resets_to_none() {
        let mut session = SessionState::new();
        session.mark_connected();
        session.apply(&HandshakeOutcome::Denied).unwrap();
        session.apply(&HandshakeOutcome::TimedOut).unwrap();
        assert_eq!(session.state(), ConnectionState::ConnectedUnauthenticated);
    }

    #[test]
    fn send_preconditions_in_order() {
        let mut session = SessionState::new();
        assert!(matches!(session.check_can_send(), Err(TvError::NotConnected)));

        session.mark_connected();
        assert!(matches!(session.check_can_send(), Err(TvError::NotAuthorized)));

        session.apply(&HandshakeOutcome::Denied).unwrap();
        assert!(matches!(session.check_can_send(), Err(TvError::NotAuthorized)));
    }

    #[test]
    fn display_format() {
        assert_eq!(ConnectionState::Disconnected.to_string(), "Disconnected");
        assert_eq!(
            ConnectionState::ConnectedAllowed.to_string(),
            "Connected (allowed)"
        );
        assert!(ConnectionState::ConnectedDenied.is_connected());
    }
}
