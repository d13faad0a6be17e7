pub mod endpoint;
pub mod transport;
pub mod websocket;

pub use endpoint::{build_url, encoded_app_name};
pub use transport::{
    Transport, TransportError, TransportEvent, TransportEventSender, TransportFactory,
    WriteCallback,
};
pub use websocket::{WsTransport, WsTransportFactory};
