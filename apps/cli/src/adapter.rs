//! Adapter bridging the live `RouterClient` to the `RouterSession`
//! trait required by `coreup-session`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use coreup_connection::{CallFailure, RouterClient};
use coreup_protocol::frame::CallReply;
use coreup_session::{EventFn, RouterSession, UpdateError};

/// Implements `RouterSession` by delegating to the router client.
pub struct RouterAdapter {
    client: Arc<RouterClient>,
}

impl RouterAdapter {
    pub fn new(client: Arc<RouterClient>) -> Self {
        Self { client }
    }
}

fn map_failure(e: CallFailure) -> UpdateError {
    match e {
        CallFailure::Rejected(err) => UpdateError::Rejected(err),
        CallFailure::Transport(err) => UpdateError::Transport(err.to_string()),
    }
}

impl RouterSession for RouterAdapter {
    fn call(
        &self,
        procedure: &str,
        args: Vec<Value>,
        kwargs: Option<Value>,
    ) -> Pin<Box<dyn Future<Output = Result<CallReply, UpdateError>> + Send + '_>> {
        let client = self.client.clone();
        let procedure = procedure.to_owned();
        Box::pin(async move {
            client
                .call(&procedure, args, kwargs)
                .await
                .map_err(map_failure)
        })
    }

    fn subscribe(
        &self,
        topic: &str,
        handler: EventFn,
    ) -> Pin<Box<dyn Future<Output = Result<u64, UpdateError>> + Send + '_>> {
        let client = self.client.clone();
        let topic = topic.to_owned();
        Box::pin(async move {
            client
                .subscribe(&topic, handler)
                .await
                .map_err(map_failure)
        })
    }

    fn is_open(&self) -> bool {
        self.client.is_open()
    }
}
