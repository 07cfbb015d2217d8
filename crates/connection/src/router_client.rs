//! WebSocket WAMP client for a single router session.
//!
//! Implements call correlation over sequential request IDs, topic
//! subscription dispatch, and ping/pong keepalive. Calls carry no
//! timeout: an unresponsive executor keeps a call pending until the
//! transport closes.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tracing::{debug, trace};

use coreup_protocol::constants::{WAMP_SUBPROTOCOL, WS_MAX_MESSAGE_SIZE};
use coreup_protocol::error::{CallError, WampError};
use coreup_protocol::frame::{CallReply, Frame};

use crate::types::RouterEndpoint;

/// Errors establishing or using the router connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("protocol error: {0}")]
    Wamp(#[from] WampError),

    #[error("session refused: {reason}")]
    Aborted { reason: String },

    #[error("unexpected frame during session establishment")]
    Handshake,

    #[error("connection closed")]
    Closed,
}

/// How a call or subscription can fail.
#[derive(Debug, thiserror::Error)]
pub enum CallFailure {
    /// The router rejected the request with a WAMP ERROR frame.
    #[error("call rejected: {0}")]
    Rejected(CallError),

    /// The transport failed before a reply arrived.
    #[error(transparent)]
    Transport(#[from] ConnectError),
}

/// Callback invoked with the `args`/`kwargs` of each event on a
/// subscribed topic.
pub type EventHandler = Box<dyn Fn(Vec<Value>, Option<Value>) + Send + Sync>;

/// Callback invoked once when the connection dies.
pub(crate) type CloseCallback = Box<dyn Fn() + Send + Sync>;

/// A subscription awaiting its SUBSCRIBED confirmation. The handler is
/// registered by the read pump the moment the confirmation arrives, so
/// no event can slip through unhandled.
pub(crate) struct PendingSubscribe {
    pub(crate) reply: oneshot::Sender<Result<u64, CallError>>,
    pub(crate) handler: EventHandler,
}

/// State shared between the client handle and its pumps.
pub(crate) struct Shared {
    pub(crate) pending_calls: Mutex<HashMap<u64, oneshot::Sender<Result<CallReply, CallError>>>>,
    pub(crate) pending_subscribes: Mutex<HashMap<u64, PendingSubscribe>>,
    pub(crate) subscriptions: Mutex<HashMap<u64, EventHandler>>,
    pub(crate) on_close: Mutex<Option<CloseCallback>>,
    pub(crate) open: AtomicBool,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            pending_calls: Mutex::new(HashMap::new()),
            pending_subscribes: Mutex::new(HashMap::new()),
            subscriptions: Mutex::new(HashMap::new()),
            on_close: Mutex::new(None),
            open: AtomicBool::new(true),
        }
    }
}

/// WAMP client connected to a single router session.
pub struct RouterClient {
    session_id: u64,
    write_tx: mpsc::Sender<tungstenite::Message>,
    next_request_id: AtomicU64,
    shared: Arc<Shared>,
    _read_handle: tokio::task::JoinHandle<()>,
    _write_handle: tokio::task::JoinHandle<()>,
    _ping_handle: tokio::task::JoinHandle<()>,
    cancel: tokio_util::sync::CancellationToken,
}

impl std::fmt::Debug for RouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterClient")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

impl RouterClient {
    /// Connects to the router and joins the realm.
    ///
    /// Session establishment (HELLO/WELCOME) happens on the raw stream;
    /// the pumps take over only once the router has welcomed us.
    pub async fn connect(endpoint: &RouterEndpoint) -> Result<Self, ConnectError> {
        let mut ws_config = tokio_tungstenite::tungstenite::protocol::WebSocketConfig::default();
        ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
        ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);

        let mut request = endpoint.url.as_str().into_client_request()?;
        request.headers_mut().insert(
            "Sec-WebSocket-Protocol",
            HeaderValue::from_static(WAMP_SUBPROTOCOL),
        );
        let (mut stream, _) =
            tokio_tungstenite::connect_async_with_config(request, Some(ws_config), false).await?;

        let hello = Frame::Hello {
            realm: endpoint.realm.clone(),
            details: client_roles(),
        };
        stream
            .send(tungstenite::Message::Text(hello.encode()?.into()))
            .await?;
        let session_id = await_welcome(&mut stream).await?;
        debug!(session_id, realm = %endpoint.realm, "router session established");

        let (write, read) = stream.split();
        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(256);
        let shared = Arc::new(Shared::new());
        let cancel = tokio_util::sync::CancellationToken::new();

        let write_handle = {
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::write_pump(write, write_rx, cancel))
        };

        let read_handle = {
            let shared = shared.clone();
            let write_tx = write_tx.clone();
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::read_pump(read, shared, write_tx, cancel))
        };

        let ping_handle = {
            let write_tx = write_tx.clone();
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::ping_pump(write_tx, cancel))
        };

        Ok(Self {
            session_id,
            write_tx,
            next_request_id: AtomicU64::new(1),
            shared,
            _read_handle: read_handle,
            _write_handle: write_handle,
            _ping_handle: ping_handle,
            cancel,
        })
    }

    /// Router-assigned session identifier.
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Whether the session is still usable.
    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::Relaxed)
    }

    /// Issues a call and waits for the RESULT or ERROR frame.
    ///
    /// Fails fast with [`ConnectError::Closed`] against a dead session
    /// rather than queueing. There is deliberately no timeout.
    pub async fn call(
        &self,
        procedure: &str,
        args: Vec<Value>,
        kwargs: Option<Value>,
    ) -> Result<CallReply, CallFailure> {
        if !self.is_open() {
            return Err(ConnectError::Closed.into());
        }

        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let frame = Frame::Call {
            request_id,
            options: json!({}),
            procedure: procedure.to_owned(),
            args,
            kwargs,
        };
        let text = frame.encode().map_err(ConnectError::from)?;

        let (tx, rx) = oneshot::channel();
        self.shared.pending_calls.lock().await.insert(request_id, tx);

        if self
            .write_tx
            .send(tungstenite::Message::Text(text.into()))
            .await
            .is_err()
        {
            self.shared.pending_calls.lock().await.remove(&request_id);
            return Err(ConnectError::Closed.into());
        }
        trace!(request_id, procedure, "call issued");

        match rx.await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(err)) => Err(CallFailure::Rejected(err)),
            // Sender dropped: the read pump drained pending calls on close.
            Err(_) => Err(ConnectError::Closed.into()),
        }
    }

    /// Subscribes to a topic, delivering each event to `handler`.
    ///
    /// Returns the router-assigned subscription ID.
    pub async fn subscribe(
        &self,
        topic: &str,
        handler: EventHandler,
    ) -> Result<u64, CallFailure> {
        if !self.is_open() {
            return Err(ConnectError::Closed.into());
        }

        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let frame = Frame::Subscribe {
            request_id,
            options: json!({}),
            topic: topic.to_owned(),
        };
        let text = frame.encode().map_err(ConnectError::from)?;

        let (tx, rx) = oneshot::channel();
        self.shared.pending_subscribes.lock().await.insert(
            request_id,
            PendingSubscribe {
                reply: tx,
                handler,
            },
        );

        if self
            .write_tx
            .send(tungstenite::Message::Text(text.into()))
            .await
            .is_err()
        {
            self.shared.pending_subscribes.lock().await.remove(&request_id);
            return Err(ConnectError::Closed.into());
        }

        match rx.await {
            Ok(Ok(subscription_id)) => {
                debug!(topic, subscription_id, "subscription active");
                Ok(subscription_id)
            }
            Ok(Err(err)) => Err(CallFailure::Rejected(err)),
            Err(_) => Err(ConnectError::Closed.into()),
        }
    }

    /// Sets the callback fired once when the connection dies.
    pub(crate) async fn set_close_callback(&self, cb: CloseCallback) {
        *self.shared.on_close.lock().await = Some(cb);
    }

    /// Gracefully closes the connection.
    pub async fn close(&self) {
        self.cancel.cancel();
        let _ = self.write_tx.send(tungstenite::Message::Close(None)).await;
    }
}

impl Drop for RouterClient {
    fn drop(&mut self) {
        self.cancel.cancel();
        self._read_handle.abort();
        self._write_handle.abort();
        self._ping_handle.abort();
    }
}

/// Roles announced in HELLO: this client only calls and subscribes.
fn client_roles() -> Value {
    json!({
        "roles": {
            "caller": {},
            "subscriber": {}
        }
    })
}

/// Waits for the router's WELCOME, mapping ABORT to a refusal error.
async fn await_welcome<S>(stream: &mut S) -> Result<u64, ConnectError>
where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    while let Some(msg) = stream.next().await {
        match msg? {
            tungstenite::Message::Text(text) => {
                return match Frame::decode(&text)? {
                    Frame::Welcome { session_id, .. } => Ok(session_id),
                    Frame::Abort { reason, .. } => Err(ConnectError::Aborted { reason }),
                    _ => Err(ConnectError::Handshake),
                };
            }
            tungstenite::Message::Close(_) => return Err(ConnectError::Closed),
            _ => continue,
        }
    }
    Err(ConnectError::Closed)
}
