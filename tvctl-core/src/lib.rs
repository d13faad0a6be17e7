//! # tvctl-core
//!
//! Client-side controller for the remote-control channel of Samsung Tizen
//! televisions.
//!
//! This crate contains:
//! - **Config**: `RemoteConfig` and the `TrustPolicy` for the TV's certificate
//! - **Network**: URL builder, the `Transport` seam and a `tokio-tungstenite` WebSocket transport
//! - **Protocol**: the handshake packet and remote command, with their JSON codec
//! - **State**: authorization status, handshake resolution and the session state machine
//! - **Controller**: `RemoteController`, a single-task actor driven through a `RemoteHandle`
//! - **Error**: `TvError` — typed, `thiserror`-based error hierarchy
//!
//! ```no_run
//! use tvctl_core::{RemoteConfig, RemoteController, RemoteEvent, WsTransportFactory};
//!
//! # async fn demo() -> Result<(), tvctl_core::TvError> {
//! let (remote, mut events) =
//!     RemoteController::spawn(RemoteConfig::new("192.168.1.2"), WsTransportFactory);
//! remote.connect()?;
//! while let Some(event) = events.recv().await {
//!     if let RemoteEvent::AuthorizationChanged(tvctl_core::AuthorizationStatus::Allowed) = event {
//!         remote.send_key("KEY_VOLUP")?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod network;
pub mod protocol;
pub mod state;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use config::{RemoteConfig, TrustPolicy};
pub use controller::{RemoteController, RemoteEvent, RemoteHandle, SessionSnapshot};
pub use error::TvError;
pub use network::{
    Transport, TransportError, TransportEvent, TransportEventSender, TransportFactory,
    WriteCallback, WsTransport, WsTransportFactory, build_url, encoded_app_name,
};
pub use protocol::{HandshakeEvent, HandshakeResponse, RemoteCommand};
pub use state::{AuthorizationStatus, ConnectionState, SessionState};
