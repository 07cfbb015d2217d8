//! Transport pumps: read dispatch, serialized writes, keepalive pings.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use coreup_protocol::constants::{
    GOODBYE_AND_OUT, WS_MAX_MESSAGE_SIZE, WS_PING_PERIOD, WS_PONG_WAIT,
};
use coreup_protocol::frame::{CallReply, Frame};
use coreup_protocol::{CallError, constants::msg_code};

use crate::router_client::Shared;

/// Reads frames from the WebSocket and dispatches them.
///
/// A silence deadline detects dead connections: any incoming message
/// resets it, and expiry closes the session. On exit, every pending call
/// and subscription is drained so waiting callers resolve with a closed
/// error, then the close callback fires exactly once.
pub(crate) async fn read_pump<S>(
    mut read: S,
    shared: Arc<Shared>,
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    let deadline = tokio::time::sleep(WS_PONG_WAIT);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            () = &mut deadline => {
                warn!("silence deadline expired, closing connection");
                break;
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(msg)) => {
                        deadline.as_mut().reset(tokio::time::Instant::now() + WS_PONG_WAIT);

                        match msg {
                            tungstenite::Message::Text(text) => {
                                if !handle_frame(&text, &shared, &write_tx).await {
                                    break;
                                }
                            }
                            tungstenite::Message::Ping(data) => {
                                trace!("received ping, sending pong");
                                let _ = write_tx.send(tungstenite::Message::Pong(data)).await;
                            }
                            tungstenite::Message::Pong(_) => {
                                trace!("received pong");
                            }
                            tungstenite::Message::Close(_) => {
                                debug!("received close frame");
                                break;
                            }
                            _ => {} // Binary — not part of the JSON serialization
                        }
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {e}");
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    shared.open.store(false, Ordering::Relaxed);

    // Drain pending work so callers resolve instead of hanging forever.
    shared.pending_calls.lock().await.clear();
    shared.pending_subscribes.lock().await.clear();
    shared.subscriptions.lock().await.clear();

    if let Some(cb) = shared.on_close.lock().await.take() {
        cb();
    }
}

/// Dispatches one text frame. Returns `false` when the session must end.
async fn handle_frame(
    text: &str,
    shared: &Shared,
    write_tx: &mpsc::Sender<tungstenite::Message>,
) -> bool {
    if text.len() > WS_MAX_MESSAGE_SIZE {
        warn!("frame too large ({} bytes), dropping", text.len());
        return true;
    }

    let frame = match Frame::decode(text) {
        Ok(f) => f,
        Err(e) => {
            warn!("failed to decode frame: {e}");
            return true;
        }
    };

    match frame {
        Frame::Result {
            request_id,
            args,
            kwargs,
            ..
        } => {
            trace!(request_id, "call result");
            match shared.pending_calls.lock().await.remove(&request_id) {
                Some(tx) => {
                    let _ = tx.send(Ok(CallReply { args, kwargs }));
                }
                None => warn!(request_id, "result for unknown call"),
            }
        }

        Frame::Error {
            request_type,
            request_id,
            error,
            args,
            kwargs,
            ..
        } => {
            let call_error = CallError::new(error, args, kwargs.as_ref());
            match request_type {
                msg_code::CALL => {
                    match shared.pending_calls.lock().await.remove(&request_id) {
                        Some(tx) => {
                            let _ = tx.send(Err(call_error));
                        }
                        None => warn!(request_id, "error for unknown call"),
                    }
                }
                msg_code::SUBSCRIBE => {
                    match shared.pending_subscribes.lock().await.remove(&request_id) {
                        Some(pending) => {
                            let _ = pending.reply.send(Err(call_error));
                        }
                        None => warn!(request_id, "error for unknown subscribe"),
                    }
                }
                other => warn!(
                    request_type = other,
                    request_id,
                    error = %call_error,
                    "error for unexpected request type"
                ),
            }
        }

        Frame::Subscribed {
            request_id,
            subscription_id,
        } => {
            match shared.pending_subscribes.lock().await.remove(&request_id) {
                Some(pending) => {
                    // Register the handler before confirming, so no event
                    // can arrive unhandled.
                    shared
                        .subscriptions
                        .lock()
                        .await
                        .insert(subscription_id, pending.handler);
                    let _ = pending.reply.send(Ok(subscription_id));
                }
                None => warn!(request_id, "SUBSCRIBED for unknown request"),
            }
        }

        Frame::Event {
            subscription_id,
            args,
            kwargs,
            ..
        } => {
            let subscriptions = shared.subscriptions.lock().await;
            match subscriptions.get(&subscription_id) {
                Some(handler) => handler(args, kwargs),
                None => debug!(subscription_id, "event for unknown subscription"),
            }
        }

        Frame::Goodbye { reason, .. } => {
            info!(reason, "router said goodbye");
            let ack = Frame::Goodbye {
                details: serde_json::json!({}),
                reason: GOODBYE_AND_OUT.into(),
            };
            if let Ok(text) = ack.encode() {
                let _ = write_tx.send(tungstenite::Message::Text(text.into())).await;
            }
            return false;
        }

        Frame::Abort { reason, .. } => {
            warn!(reason, "router aborted the session");
            return false;
        }

        other => {
            warn!(?other, "unexpected frame");
        }
    }

    true
}

/// Writes messages to the WebSocket in arrival order.
pub(crate) async fn write_pump<S>(
    mut write: S,
    mut write_rx: mpsc::Receiver<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: SinkExt<tungstenite::Message, Error = tungstenite::Error> + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            msg = write_rx.recv() => {
                match msg {
                    Some(m) => {
                        if let Err(e) = write.send(m).await {
                            error!("WebSocket write error: {e}");
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    let _ = write.send(tungstenite::Message::Close(None)).await;
}

/// Sends periodic pings so the router sees a live peer and the read
/// pump's silence deadline keeps getting fed by pongs.
pub(crate) async fn ping_pump(
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(WS_PING_PERIOD);
    interval.tick().await; // Skip the immediate first tick.

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let ping = tungstenite::Message::Ping(vec![].into());
                if write_tx.send(ping).await.is_err() {
                    break;
                }
            }
        }
    }
}
