pub mod auth;
pub mod session;

pub use auth::{
    AuthorizationStatus, HandshakeOutcome, TokenSource, resolve_handshake, resolve_token,
};
pub use session::{ConnectionState, SessionState};
