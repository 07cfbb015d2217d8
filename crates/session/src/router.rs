//! Router session trait — the seam between update logic and transport.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use coreup_protocol::frame::CallReply;

use crate::error::UpdateError;

/// Callback receiving the `args`/`kwargs` of each event on a topic.
pub type EventFn = Box<dyn Fn(Vec<Value>, Option<Value>) + Send + Sync>;

/// Abstract WAMP session the update flow runs against.
///
/// The host app implements this on top of the real router client;
/// tests use mocks.
pub trait RouterSession: Send + Sync {
    /// Issues a call and waits for the reply.
    fn call(
        &self,
        procedure: &str,
        args: Vec<Value>,
        kwargs: Option<Value>,
    ) -> Pin<Box<dyn Future<Output = Result<CallReply, UpdateError>> + Send + '_>>;

    /// Subscribes to a topic, delivering each event to `handler`.
    /// Returns the subscription ID.
    fn subscribe(
        &self,
        topic: &str,
        handler: EventFn,
    ) -> Pin<Box<dyn Future<Output = Result<u64, UpdateError>> + Send + '_>>;

    /// Whether an open session currently exists.
    fn is_open(&self) -> bool;
}
