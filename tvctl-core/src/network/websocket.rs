//! WebSocket transport on top of `tokio-tungstenite`.
//!
//! Each [`WsTransport`] runs one background task that opens the socket,
//! forwards inbound frames as [`TransportEvent`]s and drains queued writes.
//! Ping/pong is answered by tungstenite itself.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{Connector, connect_async_tls_with_config};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::config::TrustPolicy;
use crate::network::transport::{
    Transport, TransportError, TransportEvent, TransportEventSender, TransportFactory,
    WriteCallback,
};

// ── Trust ────────────────────────────────────────────────────────

/// Certificate verifier that accepts whatever the TV presents.
///
/// Chain and host name are not checked. Handshake signatures still are,
/// so the peer must hold the key of the certificate it sent.
#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// TLS connector for `trust`. `None` lets tokio-tungstenite validate
/// against the bundled Web PKI roots.
fn connector_for(trust: TrustPolicy) -> Result<Option<Connector>, TransportError> {
    match trust {
        TrustPolicy::AcceptAny => {
            let provider = Arc::new(rustls::crypto::ring::default_provider());
            let config = rustls::ClientConfig::builder_with_provider(provider.clone())
                .with_safe_default_protocol_versions()?
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate { provider }))
                .with_no_client_auth();
            Ok(Some(Connector::Rustls(Arc::new(config))))
        }
        TrustPolicy::WebPki => {
            // Already installed is fine.
            let _ = rustls::crypto::ring::default_provider().install_default();
            Ok(None)
        }
    }
}

// ── WsTransport ──────────────────────────────────────────────────

struct Outbound {
    text: String,
    on_complete: WriteCallback,
}

/// A single WebSocket connection to the TV.
pub struct WsTransport {
    url: Url,
    trust: TrustPolicy,
    events: TransportEventSender,
    outbound: Option<mpsc::UnboundedSender<Outbound>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl WsTransport {
    pub fn new(url: Url, trust: TrustPolicy, events: TransportEventSender) -> Self {
        Self {
            url,
            trust,
            events,
            outbound: None,
            cancel: CancellationToken::new(),
            task: None,
        }
    }
}

impl Transport for WsTransport {
    fn connect(&mut self) {
        if self.task.is_some() {
            warn!("websocket transport already started");
            return;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.outbound = Some(tx);
        self.task = Some(tokio::spawn(run_socket(
            self.url.clone(),
            self.trust,
            self.events.clone(),
            rx,
            self.cancel.clone(),
        )));
    }

    fn disconnect(&mut self) {
        self.outbound = None;
        self.cancel.cancel();
    }

    fn write(&mut self, text: String, on_complete: WriteCallback) {
        let Some(tx) = &self.outbound else {
            on_complete(Err(TransportError::NotConnected));
            return;
        };
        if let Err(mpsc::error::SendError(out)) = tx.send(Outbound { text, on_complete }) {
            (out.on_complete)(Err(TransportError::Closed));
        }
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Creates a [`WsTransport`] per connection attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransportFactory;

impl TransportFactory for WsTransportFactory {
    type Transport = WsTransport;

    fn create(&mut self, url: Url, trust: TrustPolicy, events: TransportEventSender) -> WsTransport {
        WsTransport::new(url, trust, events)
    }
}

// ── Socket task ──────────────────────────────────────────────────

async fn run_socket(
    url: Url,
    trust: TrustPolicy,
    events: TransportEventSender,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    cancel: CancellationToken,
) {
    let connector = match connector_for(trust) {
        Ok(c) => c,
        Err(e) => {
            events.send(TransportEvent::Error(e));
            events.send(TransportEvent::Disconnected);
            return;
        }
    };

    debug!(host = url.host_str().unwrap_or_default(), "opening websocket");
    let socket = tokio::select! {
        _ = cancel.cancelled() => {
            events.send(TransportEvent::Cancelled);
            return;
        }
        res = connect_async_tls_with_config(url.as_str(), None, true, connector) => match res {
            Ok((socket, _response)) => socket,
            Err(e) => {
                events.send(TransportEvent::Error(e.into()));
                events.send(TransportEvent::Disconnected);
                return;
            }
        }
    };

    events.send(TransportEvent::Connected);
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                if let Err(e) = sink.send(Message::Close(None)).await {
                    debug!("close frame not sent: {e}");
                }
                events.send(TransportEvent::Cancelled);
                return;
            }

            Some(out) = outbound.recv() => {
                let result = sink
                    .send(Message::text(out.text))
                    .await
                    .map_err(TransportError::from);
                (out.on_complete)(result);
            }

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    events.send(TransportEvent::Text(text.to_string()));
                }
                Some(Ok(Message::Binary(data))) => {
                    events.send(TransportEvent::Binary(data));
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "peer closed websocket");
                    events.send(TransportEvent::Disconnected);
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    events.send(TransportEvent::Error(e.into()));
                    events.send(TransportEvent::Disconnected);
                    return;
                }
                None => {
                    events.send(TransportEvent::Disconnected);
                    return;
                }
            }
        }
    }
}
