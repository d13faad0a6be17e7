//! Wire messages of the remote-control channel and their JSON codec.
//!
//! The channel carries two shapes: the handshake packet the TV sends after
//! a connection opens, and the remote command the client sends per key.

pub mod command;
pub mod handshake;

pub use command::{CommandKind, ControlMethod, RemoteCommand, RemoteParams, RemoteType};
pub use handshake::{
    ClientAttributes, HandshakeData, HandshakeEvent, HandshakeResponse, PairedClient,
};

use crate::error::TvError;

/// Decode a handshake packet from raw bytes.
pub fn parse_packet(bytes: &[u8]) -> Result<HandshakeResponse, TvError> {
    serde_json::from_slice(bytes).map_err(|e| TvError::PacketParsingFailed(e.to_string()))
}

/// Decode a handshake packet delivered as a text frame (UTF-8).
pub fn parse_text(text: &str) -> Result<HandshakeResponse, TvError> {
    parse_packet(text.as_bytes())
}

/// Encode a remote command as a JSON text frame.
pub fn encode_command(command: &RemoteCommand) -> Result<String, TvError> {
    serde_json::to_string(command).map_err(|e| TvError::CommandSerializationFailed(e.to_string()))
}
