//! Connection manager owning the single router connection.
//!
//! Tracks the `Unopened → Open → Closed` lifecycle, classifies close
//! reasons, and hands out the live [`RouterClient`] handle. There is no
//! reconnection: a closed manager stays closed, and `open()` on it
//! fails fast.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tracing::{info, warn};

use crate::router_client::{ConnectError, RouterClient};
use crate::types::{CloseReason, ConnectionEvent, ConnectionState, RouterEndpoint};

/// Manager for the single router connection of this process.
pub struct ConnectionManager {
    endpoint: RouterEndpoint,
    client: Mutex<Option<Arc<RouterClient>>>,
    state: Arc<RwLock<ConnectionState>>,
    close_reason: Arc<RwLock<Option<CloseReason>>>,
    shutting_down: Arc<AtomicBool>,
    events_tx: mpsc::Sender<ConnectionEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<ConnectionEvent>>>,
}

impl ConnectionManager {
    /// Creates a manager for the given endpoint. Nothing connects until
    /// [`open`](Self::open) is called.
    pub fn new(endpoint: RouterEndpoint) -> Self {
        let (events_tx, events_rx) = mpsc::channel(64);
        Self {
            endpoint,
            client: Mutex::new(None),
            state: Arc::new(RwLock::new(ConnectionState::Unopened)),
            close_reason: Arc::new(RwLock::new(None)),
            shutting_down: Arc::new(AtomicBool::new(false)),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&self) -> Option<mpsc::Receiver<ConnectionEvent>> {
        self.events_rx.lock().take()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Why the connection closed, once it has.
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason.read().clone()
    }

    /// The live client handle, while the connection is open.
    pub fn client(&self) -> Option<Arc<RouterClient>> {
        self.client.lock().clone()
    }

    /// Whether an open session currently exists.
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
            && self.client().is_some_and(|c| c.is_open())
    }

    /// Opens the router connection.
    ///
    /// Idempotent while open: returns the existing handle. Once closed,
    /// the manager is spent and this fails fast with
    /// [`ConnectError::Closed`].
    pub async fn open(&self) -> Result<Arc<RouterClient>, ConnectError> {
        match self.state() {
            ConnectionState::Open => {
                if let Some(client) = self.client() {
                    return Ok(client);
                }
            }
            ConnectionState::Closed => return Err(ConnectError::Closed),
            ConnectionState::Unopened => {}
        }

        info!(
            url = %self.endpoint.url,
            realm = %self.endpoint.realm,
            "opening router connection"
        );

        match RouterClient::connect(&self.endpoint).await {
            Ok(client) => {
                let client = Arc::new(client);

                let state = self.state.clone();
                let close_reason = self.close_reason.clone();
                let shutting_down = self.shutting_down.clone();
                let events_tx = self.events_tx.clone();
                client
                    .set_close_callback(Box::new(move || {
                        if shutting_down.load(Ordering::Relaxed) {
                            return;
                        }
                        warn!("router connection lost");
                        *state.write() = ConnectionState::Closed;
                        *close_reason.write() = Some(CloseReason::Lost);
                        let _ = events_tx.try_send(ConnectionEvent::Closed {
                            reason: CloseReason::Lost,
                        });
                    }))
                    .await;

                *self.client.lock() = Some(client.clone());
                *self.state.write() = ConnectionState::Open;
                let _ = self
                    .events_tx
                    .send(ConnectionEvent::Opened {
                        session_id: client.session_id(),
                    })
                    .await;

                info!(session_id = client.session_id(), "connected to router");
                Ok(client)
            }
            Err(e) => {
                let reason = classify_connect_error(&e);
                warn!(error = %e, reason = %reason, "connection failed");
                *self.state.write() = ConnectionState::Closed;
                *self.close_reason.write() = Some(reason.clone());
                let _ = self
                    .events_tx
                    .send(ConnectionEvent::Closed { reason })
                    .await;
                Err(e)
            }
        }
    }

    /// Shuts the connection down for good.
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::Relaxed);
        if let Some(client) = self.client.lock().take() {
            client.close().await;
        }
        let was_open = self.state() == ConnectionState::Open;
        *self.state.write() = ConnectionState::Closed;
        if was_open {
            *self.close_reason.write() = Some(CloseReason::Other("shutdown".into()));
        }
        info!("connection manager shut down");
    }
}

/// Maps a connect failure to the close reason surfaced to the host.
///
/// URL errors (unsupported scheme, TLS support missing) and refused
/// WebSocket upgrades are the security/protocol mismatches the host
/// renders mixed-content remediation for; everything else is ordinary.
fn classify_connect_error(err: &ConnectError) -> CloseReason {
    match err {
        ConnectError::Ws(ws) => match ws {
            tungstenite::Error::Url(_) => CloseReason::Unsupported,
            tungstenite::Error::Http(response)
                if response.status() == tungstenite::http::StatusCode::UPGRADE_REQUIRED =>
            {
                CloseReason::Unsupported
            }
            other => CloseReason::Other(other.to_string()),
        },
        ConnectError::Aborted { reason } => CloseReason::Aborted {
            reason: reason.clone(),
        },
        other => CloseReason::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tungstenite::error::UrlError;

    fn test_endpoint() -> RouterEndpoint {
        RouterEndpoint {
            url: "ws://127.0.0.1:1/ws".into(),
            realm: "realm1".into(),
        }
    }

    #[test]
    fn new_manager_is_unopened() {
        let mgr = ConnectionManager::new(test_endpoint());
        assert_eq!(mgr.state(), ConnectionState::Unopened);
        assert!(mgr.client().is_none());
        assert!(mgr.close_reason().is_none());
        assert!(!mgr.is_open());
    }

    #[test]
    fn take_events_once() {
        let mgr = ConnectionManager::new(test_endpoint());
        assert!(mgr.take_events().is_some());
        assert!(mgr.take_events().is_none());
    }

    #[tokio::test]
    async fn failed_open_closes_the_manager() {
        let mgr = ConnectionManager::new(test_endpoint());
        let mut events = mgr.take_events().unwrap();

        let result = mgr.open().await;
        assert!(result.is_err());
        assert_eq!(mgr.state(), ConnectionState::Closed);
        assert!(mgr.close_reason().is_some());

        let event = events.recv().await.unwrap();
        assert!(matches!(event, ConnectionEvent::Closed { .. }));
    }

    #[tokio::test]
    async fn open_after_close_fails_fast() {
        let mgr = ConnectionManager::new(test_endpoint());
        let _ = mgr.open().await;
        assert_eq!(mgr.state(), ConnectionState::Closed);

        // The manager is spent; no second connection attempt is made.
        let err = mgr.open().await.unwrap_err();
        assert!(matches!(err, ConnectError::Closed));
    }

    #[tokio::test]
    async fn shutdown_when_never_opened_is_clean() {
        let mgr = ConnectionManager::new(test_endpoint());
        mgr.shutdown().await;
        mgr.shutdown().await;
        assert_eq!(mgr.state(), ConnectionState::Closed);
        assert!(mgr.close_reason().is_none());
    }

    #[test]
    fn url_errors_classify_as_unsupported() {
        let err = ConnectError::Ws(tungstenite::Error::Url(UrlError::UnsupportedUrlScheme));
        let reason = classify_connect_error(&err);
        assert_eq!(reason, CloseReason::Unsupported);
        assert!(reason.is_mixed_content());

        let err = ConnectError::Ws(tungstenite::Error::Url(UrlError::TlsFeatureNotEnabled));
        assert_eq!(classify_connect_error(&err), CloseReason::Unsupported);
    }

    #[test]
    fn upgrade_required_classifies_as_unsupported() {
        let response = tungstenite::http::Response::builder()
            .status(tungstenite::http::StatusCode::UPGRADE_REQUIRED)
            .body(None)
            .unwrap();
        let err = ConnectError::Ws(tungstenite::Error::Http(response));
        assert_eq!(classify_connect_error(&err), CloseReason::Unsupported);
    }

    #[test]
    fn other_http_status_is_not_mixed_content() {
        let response = tungstenite::http::Response::builder()
            .status(tungstenite::http::StatusCode::NOT_FOUND)
            .body(None)
            .unwrap();
        let err = ConnectError::Ws(tungstenite::Error::Http(response));
        assert!(!classify_connect_error(&err).is_mixed_content());
    }

    #[test]
    fn abort_classifies_with_reason() {
        let err = ConnectError::Aborted {
            reason: "wamp.error.no_such_realm".into(),
        };
        let reason = classify_connect_error(&err);
        assert_eq!(
            reason,
            CloseReason::Aborted {
                reason: "wamp.error.no_such_realm".into()
            }
        );
        assert!(!reason.is_mixed_content());
    }

    #[test]
    fn io_errors_classify_as_other() {
        let err = ConnectError::Ws(tungstenite::Error::Io(std::io::Error::other(
            "connection refused",
        )));
        assert!(matches!(
            classify_connect_error(&err),
            CloseReason::Other(_)
        ));
    }
}
