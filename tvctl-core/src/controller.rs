//! Connection controller.
//!
//! `RemoteController` owns the configuration, the session state and the
//! transport of one TV connection. It runs as a single tokio task: caller
//! requests (from any number of [`RemoteHandle`] clones) and transport
//! events are both funnelled into one `select!` loop, so state is only
//! ever touched from that task.
//!
//! Every outcome, including every failure, is reported through the
//! [`RemoteEvent`] channel returned by [`RemoteController::spawn`].

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::RemoteConfig;
use crate::error::TvError;
use crate::network::{
    Transport, TransportError, TransportEvent, TransportEventSender, TransportFactory, build_url,
    encoded_app_name,
};
use crate::protocol::{self, HandshakeResponse, RemoteCommand};
use crate::state::{
    AuthorizationStatus, ConnectionState, HandshakeOutcome, SessionState, TokenSource,
    resolve_handshake,
};

// ── Events ───────────────────────────────────────────────────────

/// Notifications delivered to the consumer.
#[derive(Debug)]
pub enum RemoteEvent {
    /// The socket is open; the handshake is pending.
    Connected,
    /// The socket closed; authorization was reset.
    Disconnected,
    /// A handshake changed the authorization status.
    AuthorizationChanged(AuthorizationStatus),
    /// A handshake handed out a session token (now stored in the config).
    TokenUpdated(String),
    /// The transport accepted a command frame. The TV does not acknowledge
    /// key presses, so this is the last word on a command.
    ///
    /// Delivered from the controller task, ahead of any transport event the
    /// socket raised after the write completed.
    CommandWritten(RemoteCommand),
    /// An operation failed and was abandoned.
    Error(TvError),
}

/// Point-in-time view of a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub state: ConnectionState,
    pub authorization: AuthorizationStatus,
    pub token: Option<String>,
}

// ── Requests ─────────────────────────────────────────────────────

#[derive(Debug)]
enum Request {
    Connect,
    Disconnect,
    SendKey(String),
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

/// Cloneable handle to a running [`RemoteController`].
///
/// Calls only queue a request and return; results arrive as
/// [`RemoteEvent`]s. Dropping the last handle stops the controller and
/// tears down its transport.
#[derive(Debug, Clone)]
pub struct RemoteHandle {
    tx: mpsc::UnboundedSender<Request>,
}

impl RemoteHandle {
    /// Open the connection.
    pub fn connect(&self) -> Result<(), TvError> {
        Ok(self.tx.send(Request::Connect)?)
    }

    /// Close the connection.
    pub fn disconnect(&self) -> Result<(), TvError> {
        Ok(self.tx.send(Request::Disconnect)?)
    }

    /// Press `key` on the remote, e.g. `KEY_VOLUP`.
    pub fn send_key(&self, key: impl Into<String>) -> Result<(), TvError> {
        Ok(self.tx.send(Request::SendKey(key.into()))?)
    }

    /// Current connection state, authorization and token.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, TvError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx.send(Request::Snapshot(reply_tx))?;
        Ok(reply_rx.await?)
    }
}

/// Result of a queued command write, handed back to the controller task.
#[derive(Debug)]
struct WriteCompletion {
    command: RemoteCommand,
    result: Result<(), TransportError>,
}

// ── RemoteController ─────────────────────────────────────────────

pub struct RemoteController<F: TransportFactory> {
    config: RemoteConfig,
    /// Base64 app name, compared against paired-client names.
    encoded_name: String,
    factory: F,
    session: SessionState,
    transport: Option<F::Transport>,
    /// Bumped per `connect()`; events from older transports are dropped.
    generation: u64,
    events: mpsc::UnboundedSender<RemoteEvent>,
    transport_tx: mpsc::UnboundedSender<(u64, TransportEvent)>,
    completions: mpsc::UnboundedSender<WriteCompletion>,
}

impl<F: TransportFactory> RemoteController<F> {
    /// Start a controller task for `config`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        config: RemoteConfig,
        factory: F,
    ) -> (RemoteHandle, mpsc::UnboundedReceiver<RemoteEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let controller = Self::new(config, factory, event_tx, transport_tx, completion_tx);
        tokio::spawn(controller.run(request_rx, transport_rx, completion_rx));

        (RemoteHandle { tx: request_tx }, event_rx)
    }

    fn new(
        config: RemoteConfig,
        factory: F,
        events: mpsc::UnboundedSender<RemoteEvent>,
        transport_tx: mpsc::UnboundedSender<(u64, TransportEvent)>,
        completions: mpsc::UnboundedSender<WriteCompletion>,
    ) -> Self {
        Self {
            encoded_name: encoded_app_name(&config.app_name),
            config,
            factory,
            session: SessionState::new(),
            transport: None,
            generation: 0,
            events,
            transport_tx,
            completions,
        }
    }

    async fn run(
        mut self,
        mut requests: mpsc::UnboundedReceiver<Request>,
        mut transport_rx: mpsc::UnboundedReceiver<(u64, TransportEvent)>,
        mut completion_rx: mpsc::UnboundedReceiver<WriteCompletion>,
    ) {
        loop {
            // Completions first: a socket finishes a write before it reports
            // the close that follows it.
            tokio::select! {
                biased;

                Some(done) = completion_rx.recv() => self.handle_write_completion(done),

                Some((generation, event)) = transport_rx.recv() => {
                    self.handle_transport_event(generation, event);
                }

                request = requests.recv() => match request {
                    Some(request) => self.handle_request(request),
                    None => break,
                },
            }
        }

        if let Some(transport) = self.transport.as_mut() {
            transport.disconnect();
        }
        debug!("remote controller stopped");
    }

    fn handle_request(&mut self, request: Request) {
        match request {
            Request::Connect => self.connect(),
            Request::Disconnect => self.disconnect(),
            Request::SendKey(key) => self.send_key(key),
            Request::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.session.state(),
            authorization: self.session.authorization(),
            token: self.config.token().map(str::to_owned),
        }
    }

    // ── Caller operations ────────────────────────────────────────

    fn connect(&mut self) {
        if self.transport.is_some() || self.session.is_connected() {
            self.report(TvError::ConnectionAlreadyEstablished);
            return;
        }

        let url = match build_url(&self.config) {
            Ok(url) => url,
            Err(e) => {
                self.report(e);
                return;
            }
        };

        self.generation += 1;
        info!(
            host = %self.config.host,
            port = self.config.port,
            paired = self.config.token().is_some(),
            "connecting to tv"
        );

        let sender = TransportEventSender::new(self.generation, self.transport_tx.clone());
        let mut transport = self.factory.create(url, self.config.trust, sender);
        transport.connect();
        self.transport = Some(transport);
    }

    fn disconnect(&mut self) {
        match self.transport.as_mut() {
            Some(transport) => {
                info!("disconnecting from tv");
                transport.disconnect();
            }
            None => self.report(TvError::NotConnected),
        }
    }

    fn send_key(&mut self, key: String) {
        if let Err(e) = self.session.check_can_send() {
            self.report(e);
            return;
        }

        let command = RemoteCommand::click(key);
        let text = match protocol::encode_command(&command) {
            Ok(text) => text,
            Err(e) => {
                self.report(e);
                return;
            }
        };

        let Some(transport) = self.transport.as_mut() else {
            self.report(TvError::NotConnected);
            return;
        };

        debug!(key = command.key(), "sending remote key");
        let completions = self.completions.clone();
        transport.write(
            text,
            Box::new(move |result| {
                let _ = completions.send(WriteCompletion { command, result });
            }),
        );
    }

    fn handle_write_completion(&mut self, done: WriteCompletion) {
        match done.result {
            Ok(()) => self.emit(RemoteEvent::CommandWritten(done.command)),
            Err(e) => self.report(TvError::Transport(e)),
        }
    }

    // ── Transport events ─────────────────────────────────────────

    fn handle_transport_event(&mut self, generation: u64, event: TransportEvent) {
        if generation != self.generation || self.transport.is_none() {
            debug!(generation, current = self.generation, "dropping stale transport event");
            return;
        }

        match event {
            TransportEvent::Connected => {
                info!("connected; awaiting handshake");
                self.session.mark_connected();
                self.emit(RemoteEvent::Connected);
            }
            TransportEvent::Disconnected | TransportEvent::Cancelled => {
                info!("disconnected");
                self.session.mark_disconnected();
                self.transport = None;
                self.emit(RemoteEvent::Disconnected);
            }
            TransportEvent::Text(text) => self.handle_packet(protocol::parse_text(&text)),
            TransportEvent::Binary(bytes) => self.handle_packet(protocol::parse_packet(&bytes)),
            TransportEvent::Error(e) => self.report(TvError::Transport(e)),
        }
    }

    fn handle_packet(&mut self, parsed: Result<HandshakeResponse, TvError>) {
        let response = match parsed {
            Ok(response) => response,
            Err(e) => {
                self.report(e);
                return;
            }
        };

        let outcome = match resolve_handshake(&response, &self.encoded_name) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.report(e);
                return;
            }
        };

        let status = match self.session.apply(&outcome) {
            Ok(status) => status,
            Err(e) => {
                self.report(e);
                return;
            }
        };
        info!(%status, event = %response.event, "handshake resolved");
        self.emit(RemoteEvent::AuthorizationChanged(status));

        if let HandshakeOutcome::Allowed(source) = outcome {
            match source {
                TokenSource::Direct(token) | TokenSource::PairedClient(token) => {
                    self.config.set_token(token.clone());
                    self.emit(RemoteEvent::TokenUpdated(token));
                }
                // Authorization stays Allowed without a token.
                TokenSource::Missing => {
                    self.report(TvError::NoTokenInHandshake(Box::new(response)));
                }
            }
        }
    }

    // ── Notification ─────────────────────────────────────────────

    fn emit(&self, event: RemoteEvent) {
        if self.events.send(event).is_err() {
            debug!("event receiver dropped");
        }
    }

    fn report(&self, error: TvError) {
        warn!("{error}");
        self.emit(RemoteEvent::Error(error));
    }
}

// ── Tests ────────────────────────────────────────────────────────
