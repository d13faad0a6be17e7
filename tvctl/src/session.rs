//! One pairing-and-keypress session against a running controller.
//!
//! The driver connects, waits for the TV to allow the client, presses the
//! requested keys in order and disconnects once every key has either been
//! written or failed.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tvctl_core::{AuthorizationStatus, RemoteEvent, RemoteHandle, TvError};

use crate::config::SessionConfig;

/// Ways a session can end without pressing every key.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("remote controller: {0}")]
    Remote(#[from] TvError),

    #[error("tv denied access; accept the client on the tv or clear its token")]
    Denied,

    #[error("no authorization from the tv after {0:?}")]
    AuthTimeout(Duration),

    #[error("connection closed after {written} of {total} keys")]
    DisconnectedEarly { written: usize, total: usize },

    #[error("{failed} of {total} keys could not be sent")]
    KeysFailed { failed: usize, total: usize },

    #[error("tv did not confirm the disconnect within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("remote controller stopped")]
    ControllerGone,
}

/// Summary of a finished session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Keys written to the socket, in order.
    pub written: Vec<String>,
    /// Keys that were refused or whose write failed.
    pub failed: usize,
    /// Token handed out during the session, if any.
    pub token: Option<String>,
}

impl SessionReport {
    fn settled(&self) -> usize {
        self.written.len() + self.failed
    }
}

/// Errors that mean a key press was dropped.
fn is_key_failure(error: &TvError) -> bool {
    matches!(
        error,
        TvError::Transport(_)
            | TvError::NotConnected
            | TvError::NotAuthorized
            | TvError::CommandSerializationFailed(_)
    )
}

/// Drive `remote` through one session pressing `keys`.
///
/// `on_token` runs for every token the TV hands out, before the first key
/// is sent. Every key ends up either written or failed; once all are
/// settled the session disconnects, and fails with
/// [`SessionError::KeysFailed`] if any key was dropped.
pub async fn run(
    remote: &RemoteHandle,
    events: &mut mpsc::UnboundedReceiver<RemoteEvent>,
    keys: &[String],
    config: &SessionConfig,
    mut on_token: impl FnMut(&str),
) -> Result<SessionReport, SessionError> {
    let auth_timeout = Duration::from_millis(config.auth_timeout_ms);
    let key_delay = Duration::from_millis(config.key_delay_ms);

    let mut report = SessionReport::default();
    let mut authorized = false;
    let mut finished = false;

    remote.connect()?;

    let deadline = tokio::time::sleep(auth_timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline, if !authorized => {
                let _ = remote.disconnect();
                return Err(SessionError::AuthTimeout(auth_timeout));
            }

            event = events.recv() => {
                let Some(event) = event else {
                    return Err(SessionError::ControllerGone);
                };
                match event {
                    RemoteEvent::Connected => {
                        info!("connected; accept the client on the tv if prompted");
                    }
                    RemoteEvent::AuthorizationChanged(AuthorizationStatus::Allowed) => {
                        if authorized {
                            continue;
                        }
                        authorized = true;
                        info!(keys = keys.len(), "authorized");
                        if keys.is_empty() {
                            finished = true;
                            remote.disconnect()?;
                        } else {
                            tokio::spawn(press_keys(remote.clone(), keys.to_vec(), key_delay));
                        }
                    }
                    RemoteEvent::AuthorizationChanged(AuthorizationStatus::Denied) => {
                        let _ = remote.disconnect();
                        return Err(SessionError::Denied);
                    }
                    RemoteEvent::AuthorizationChanged(AuthorizationStatus::None) => {}
                    RemoteEvent::TokenUpdated(token) => {
                        on_token(&token);
                        report.token = Some(token);
                    }
                    RemoteEvent::CommandWritten(command) => {
                        info!(key = command.key(), "key sent");
                        report.written.push(command.key().to_owned());
                        if report.settled() == keys.len() && !finished {
                            finished = true;
                            remote.disconnect()?;
                        }
                    }
                    RemoteEvent::Error(e) => {
                        warn!("{e}");
                        let pending = authorized && !finished && report.settled() < keys.len();
                        if pending && is_key_failure(&e) {
                            report.failed += 1;
                            if report.settled() == keys.len() {
                                finished = true;
                                remote.disconnect()?;
                            }
                        }
                    }
                    RemoteEvent::Disconnected => {
                        if finished && report.failed > 0 {
                            return Err(SessionError::KeysFailed {
                                failed: report.failed,
                                total: keys.len(),
                            });
                        }
                        if finished {
                            return Ok(report);
                        }
                        return Err(SessionError::DisconnectedEarly {
                            written: report.written.len(),
                            total: keys.len(),
                        });
                    }
                }
            }
        }
    }
}

/// Ask the controller to disconnect and wait until the socket is closed.
///
/// Returns once `Disconnected` arrives, or straight away if there was no
/// connection to close.
pub async fn shutdown(
    remote: &RemoteHandle,
    events: &mut mpsc::UnboundedReceiver<RemoteEvent>,
    wait: Duration,
) -> Result<(), SessionError> {
    remote.disconnect()?;

    let closed = async {
        while let Some(event) = events.recv().await {
            match event {
                RemoteEvent::Disconnected | RemoteEvent::Error(TvError::NotConnected) => {
                    return Ok(());
                }
                _ => {}
            }
        }
        Err(SessionError::ControllerGone)
    };

    tokio::time::timeout(wait, closed)
        .await
        .map_err(|_| SessionError::ShutdownTimeout(wait))?
}

async fn press_keys(remote: RemoteHandle, keys: Vec<String>, delay: Duration) {
    for (i, key) in keys.into_iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(delay).await;
        }
        if let Err(e) = remote.send_key(key) {
            error!("key not queued: {e}");
            return;
        }
    }
}
