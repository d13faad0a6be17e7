//! Connection parameters for a single television.
//!
//! Everything except the session token is fixed once a controller has been
//! spawned; the token is refreshed by the controller when a handshake
//! hands out a new one.

use serde::{Deserialize, Serialize};

/// Default secure WebSocket port of the remote-control service.
pub const DEFAULT_PORT: u16 = 8002;

/// Channel path of the remote-control service.
pub const DEFAULT_PATH: &str = "/api/v2/channels/samsung.remote.control";

/// Scheme used for the remote-control channel.
pub const DEFAULT_SCHEME: &str = "wss";

/// Name the client announces itself with (sent base64-encoded).
pub const DEFAULT_APP_NAME: &str = "tvctl";

// ── TrustPolicy ──────────────────────────────────────────────────

/// How the TLS layer treats the certificate presented by the TV.
///
/// Televisions ship self-signed certificates, so the default accepts any
/// certificate. This is a deliberate relaxation and must be opted out of
/// explicitly with [`TrustPolicy::WebPki`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrustPolicy {
    /// Accept any certificate without chain validation.
    #[default]
    AcceptAny,
    /// Validate against the bundled Web PKI roots.
    WebPki,
}

// ── RemoteConfig ─────────────────────────────────────────────────

/// Immutable connection parameters plus the mutable session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Application identifier shown on the TV's pairing prompt.
    pub app_name: String,
    /// Channel path, e.g. `/api/v2/channels/samsung.remote.control`.
    pub path: String,
    /// TV host name or IP address.
    pub host: String,
    /// TV port.
    pub port: u16,
    /// URI scheme (`wss` or `ws`).
    pub scheme: String,
    /// Session token issued by the TV on a previous handshake.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Certificate trust policy.
    pub trust: TrustPolicy,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.into(),
            path: DEFAULT_PATH.into(),
            host: "192.168.1.2".into(),
            port: DEFAULT_PORT,
            scheme: DEFAULT_SCHEME.into(),
            token: None,
            trust: TrustPolicy::default(),
        }
    }
}

impl RemoteConfig {
    /// Config for `host` with every other field at its default.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_trust(mut self, trust: TrustPolicy) -> Self {
        self.trust = trust;
        self
    }

    /// The session token, if one is known and non-empty.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    /// Replace the session token.
    pub(crate) fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }
}

// ── Tests ────────────────────────────────────────────────────────
