//! Integration tests — the controller task driven through its handle,
//! first over a scripted transport and then over a real WebSocket on
//! localhost.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio_test::{assert_err, assert_ok};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tvctl_core::{
    AuthorizationStatus, ConnectionState, RemoteConfig, RemoteController, RemoteEvent, Transport,
    TransportEvent, TransportEventSender, TransportFactory, TrustPolicy, TvError, WriteCallback,
    WsTransportFactory,
};
use url::Url;

// ── Helpers ──────────────────────────────────────────────────────

async fn next_event(events: &mut mpsc::UnboundedReceiver<RemoteEvent>) -> RemoteEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timeout")
        .expect("event channel closed")
}

/// Transport whose events are injected by the test.
#[derive(Default, Clone)]
struct Script {
    senders: Arc<Mutex<Vec<TransportEventSender>>>,
    writes: Arc<Mutex<Vec<String>>>,
    /// When set, write callbacks are parked here instead of completing.
    held: Option<Arc<Mutex<Vec<WriteCallback>>>>,
}

impl Script {
    fn emit(&self, event: TransportEvent) {
        let senders = self.senders.lock().unwrap();
        senders.last().expect("no transport created").send(event);
    }

    fn transports(&self) -> usize {
        self.senders.lock().unwrap().len()
    }
}

struct ScriptedTransport {
    events: TransportEventSender,
    writes: Arc<Mutex<Vec<String>>>,
    held: Option<Arc<Mutex<Vec<WriteCallback>>>>,
}

impl Transport for ScriptedTransport {
    fn connect(&mut self) {}

    fn disconnect(&mut self) {
        self.events.send(TransportEvent::Cancelled);
    }

    fn write(&mut self, text: String, on_complete: WriteCallback) {
        self.writes.lock().unwrap().push(text);
        match &self.held {
            Some(held) => held.lock().unwrap().push(on_complete),
            None => on_complete(Ok(())),
        }
    }
}

impl TransportFactory for Script {
    type Transport = ScriptedTransport;

    fn create(
        &mut self,
        _url: Url,
        _trust: TrustPolicy,
        events: TransportEventSender,
    ) -> ScriptedTransport {
        self.senders.lock().unwrap().push(events.clone());
        ScriptedTransport {
            events,
            writes: self.writes.clone(),
            held: self.held.clone(),
        }
    }
}

// ── Scripted transport ───────────────────────────────────────────

#[tokio::test]
async fn test_scripted_session_lifecycle() {
    let script = Script::default();
    let (remote, mut events) = RemoteController::spawn(
        RemoteConfig::new("192.168.1.2").with_app_name("MyApp"),
        script.clone(),
    );

    assert_ok!(remote.connect());
    assert_ok!(remote.connect());
    assert!(matches!(
        next_event(&mut events).await,
        RemoteEvent::Error(TvError::ConnectionAlreadyEstablished)
    ));
    assert_eq!(script.transports(), 1);

    script.emit(TransportEvent::Connected);
    assert!(matches!(next_event(&mut events).await, RemoteEvent::Connected));

    // Keys are refused until the TV says yes.
    remote.send_key("KEY_VOLUP").unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        RemoteEvent::Error(TvError::NotAuthorized)
    ));

    script.emit(TransportEvent::Text(
        r#"{"event":"ms.channel.connect","data":{"token":"T1"}}"#.into(),
    ));
    assert!(matches!(
        next_event(&mut events).await,
        RemoteEvent::AuthorizationChanged(AuthorizationStatus::Allowed)
    ));
    assert!(matches!(
        next_event(&mut events).await,
        RemoteEvent::TokenUpdated(t) if t == "T1"
    ));

    let snap = remote.snapshot().await.unwrap();
    assert_eq!(snap.state, ConnectionState::ConnectedAllowed);
    assert_eq!(snap.token.as_deref(), Some("T1"));

    remote.send_key("VOLUME_UP").unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        RemoteEvent::CommandWritten(cmd) if cmd.key() == "VOLUME_UP"
    ));
    {
        let writes = script.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert!(writes[0].contains("VOLUME_UP"));
    }

    remote.disconnect().unwrap();
    assert!(matches!(next_event(&mut events).await, RemoteEvent::Disconnected));

    let snap = remote.snapshot().await.unwrap();
    assert_eq!(snap.state, ConnectionState::Disconnected);
    assert_eq!(snap.authorization, AuthorizationStatus::None);

    remote.send_key("VOLUME_UP").unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        RemoteEvent::Error(TvError::NotConnected)
    ));
    assert_eq!(script.writes.lock().unwrap().len(), 1);

    // A new connect() builds a new transport.
    remote.connect().unwrap();
    let _ = remote.snapshot().await.unwrap();
    assert_eq!(script.transports(), 2);
}

#[tokio::test]
async fn test_controller_survives_dropped_event_receiver() {
    let (remote, events) =
        RemoteController::spawn(RemoteConfig::new("192.168.1.2"), Script::default());
    drop(events);
    // The controller keeps running without a consumer.
    assert_ok!(remote.snapshot().await);
}

#[test]
fn test_handle_errors_once_controller_is_gone() {
    let remote = {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let (remote, _events) = runtime.block_on(async {
            RemoteController::spawn(RemoteConfig::new("192.168.1.2"), Script::default())
        });
        remote
        // Dropping the runtime drops the controller task.
    };
    assert!(matches!(
        assert_err!(remote.connect()),
        TvError::ChannelClosed
    ));
}

#[tokio::test]
async fn test_write_completion_precedes_following_close() {
    let held = Arc::new(Mutex::new(Vec::new()));
    let script = Script {
        held: Some(held.clone()),
        ..Script::default()
    };
    let (remote, mut events) =
        RemoteController::spawn(RemoteConfig::new("192.168.1.2"), script.clone());

    remote.connect().unwrap();
    let _ = remote.snapshot().await.unwrap();
    script.emit(TransportEvent::Connected);
    script.emit(TransportEvent::Text(
        r#"{"event":"ms.channel.connect","data":{"token":"T1"}}"#.into(),
    ));
    remote.send_key("KEY_MUTE").unwrap();
    let _ = remote.snapshot().await.unwrap();

    // The socket finishes the write, then sees the peer hang up, before
    // the controller gets to run again.
    let callback = held.lock().unwrap().pop().expect("write not issued");
    callback(Ok(()));
    script.emit(TransportEvent::Disconnected);

    let mut tail = Vec::new();
    loop {
        let event = next_event(&mut events).await;
        let done = matches!(event, RemoteEvent::Disconnected);
        tail.push(event);
        if done {
            break;
        }
    }
    assert!(matches!(
        tail.as_slice(),
        [
            RemoteEvent::Connected,
            RemoteEvent::AuthorizationChanged(AuthorizationStatus::Allowed),
            RemoteEvent::TokenUpdated(_),
            RemoteEvent::CommandWritten(cmd),
            RemoteEvent::Disconnected,
        ] if cmd.key() == "KEY_MUTE"
    ));
}

// ── Real WebSocket ───────────────────────────────────────────────

#[tokio::test]
async fn test_websocket_handshake_and_key() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (uri_tx, uri_rx) = oneshot::channel::<String>();
    let (key_tx, key_rx) = oneshot::channel::<String>();

    // Fake TV: accept, hand out a token, read one command, hang up.
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let record_uri = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let _ = uri_tx.send(req.uri().to_string());
            Ok(resp)
        };
        let mut ws = tokio_tungstenite::accept_hdr_async(stream, record_uri)
            .await
            .unwrap();

        ws.send(Message::text(
            r#"{"event":"ms.channel.connect","data":{"token":"T1"}}"#,
        ))
        .await
        .unwrap();

        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                let _ = key_tx.send(text.to_string());
                break;
            }
        }
        let _ = ws.close(None).await;
    });

    let mut config = RemoteConfig::new("127.0.0.1").with_app_name("MyApp");
    config.scheme = "ws".into();
    config.port = addr.port();

    let (remote, mut events) = RemoteController::spawn(config, WsTransportFactory);
    remote.connect().unwrap();

    assert!(matches!(next_event(&mut events).await, RemoteEvent::Connected));
    let uri = uri_rx.await.unwrap();
    assert!(uri.starts_with("/api/v2/channels/samsung.remote.control?name=TXlBcHA="));
    assert!(!uri.contains("token="));

    assert!(matches!(
        next_event(&mut events).await,
        RemoteEvent::AuthorizationChanged(AuthorizationStatus::Allowed)
    ));
    assert!(matches!(
        next_event(&mut events).await,
        RemoteEvent::TokenUpdated(t) if t == "T1"
    ));

    remote.send_key("KEY_VOLUP").unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        RemoteEvent::CommandWritten(cmd) if cmd.key() == "KEY_VOLUP"
    ));

    let sent: serde_json::Value = serde_json::from_str(&key_rx.await.unwrap()).unwrap();
    assert_eq!(sent["method"], "ms.remote.control");
    assert_eq!(sent["params"]["DataOfCmd"], "KEY_VOLUP");
    assert_eq!(sent["params"]["Option"], false);
    assert_eq!(sent["params"]["TypeOfRemote"], "SendRemoteKey");

    // The fake TV closes after one key.
    assert!(matches!(next_event(&mut events).await, RemoteEvent::Disconnected));
    assert_eq!(
        remote.snapshot().await.unwrap().authorization,
        AuthorizationStatus::None
    );

    server.await.unwrap();
}

#[tokio::test]
async fn test_websocket_connect_refused() {
    // Bind then drop to get a port nobody listens on.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let mut config = RemoteConfig::new("127.0.0.1");
    config.scheme = "ws".into();
    config.port = port;

    let (remote, mut events) = RemoteController::spawn(config, WsTransportFactory);
    remote.connect().unwrap();

    assert!(matches!(
        next_event(&mut events).await,
        RemoteEvent::Error(TvError::Transport(_))
    ));
    assert!(matches!(next_event(&mut events).await, RemoteEvent::Disconnected));

    // The failed transport was released, so connecting again is allowed.
    remote.connect().unwrap();
    assert!(matches!(
        next_event(&mut events).await,
        RemoteEvent::Error(TvError::Transport(_))
    ));
}
