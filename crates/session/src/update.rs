//! The update session: one trigger, one call, one status.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use coreup_protocol::constants::{install_procedure, log_topic};
use coreup_protocol::messages::{InstallRequest, InstallResult, ProgressEnvelope};

use crate::error::{GENERIC_FAILURE, UpdateError};
use crate::router::{EventFn, RouterSession};
use crate::types::{Phase, SessionState, Status};

/// Progress text shown between the trigger and the first log event.
pub const PLACEHOLDER_PROGRESS: &str = "Updating...";

/// Drives the single core update of this process.
///
/// Holds the status state machine and reconciles two inputs: the
/// outcome of the install call it issues, and the progress-log events
/// arriving on the standing subscription. Log events only ever change
/// the visible progress text; the call outcome alone decides success
/// or failure.
pub struct UpdateSession {
    service: String,
    package_id: String,
    state: Arc<RwLock<SessionState>>,
}

impl UpdateSession {
    /// Creates a session for the given service and package.
    pub fn new(service: impl Into<String>, package_id: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            package_id: package_id.into(),
            state: Arc::new(RwLock::new(SessionState::new())),
        }
    }

    /// Current observable status.
    pub fn status(&self) -> Status {
        self.state.read().snapshot()
    }

    /// Subscribes to the progress-log topic. Called once after the
    /// connection opens.
    ///
    /// Failure is non-fatal: the trigger still works, just without live
    /// progress text.
    pub async fn subscribe_progress(&self, router: &dyn RouterSession) {
        let topic = log_topic(&self.service);
        let state = self.state.clone();
        let handler: EventFn = Box::new(move |_args, kwargs| {
            let Some(kwargs) = kwargs else {
                return;
            };
            let envelope: ProgressEnvelope = match serde_json::from_value(kwargs) {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "undecodable progress event");
                    return;
                }
            };
            let mut state = state.write();
            if envelope.data.clear {
                state.progress.clear();
            } else {
                state.progress = envelope.data.display_line();
            }
        });

        match router.subscribe(&topic, handler).await {
            Ok(subscription_id) => {
                debug!(topic, subscription_id, "progress subscription active");
            }
            Err(e) => {
                warn!(topic, error = %e, "progress subscription failed, continuing without live progress");
            }
        }
    }

    /// Triggers the update.
    ///
    /// A no-op while a call is in flight or after success. Otherwise
    /// issues exactly one install call and resolves the status from its
    /// outcome. Returns the status after the call settles.
    pub async fn trigger(&self, router: &dyn RouterSession) -> Status {
        {
            let mut state = self.state.write();
            match state.phase {
                Phase::InFlight => {
                    debug!("update already in flight, ignoring trigger");
                    return state.snapshot();
                }
                Phase::Succeeded => {
                    debug!("update already succeeded, ignoring trigger");
                    return state.snapshot();
                }
                Phase::Idle | Phase::Failed(_) => {}
            }
            state.phase = Phase::InFlight;
            state.progress = PLACEHOLDER_PROGRESS.into();
        }

        let outcome = self.run_install(router).await;

        let mut state = self.state.write();
        state.progress.clear();
        match outcome {
            Ok(()) => {
                info!(package = %self.package_id, "core update succeeded");
                state.phase = Phase::Succeeded;
            }
            Err(e) => {
                error!(error = %e, "core update failed");
                state.phase = Phase::Failed(e.to_string());
            }
        }
        state.snapshot()
    }

    async fn run_install(&self, router: &dyn RouterSession) -> Result<(), UpdateError> {
        if !router.is_open() {
            return Err(UpdateError::SessionNotOpen);
        }

        let procedure = install_procedure(&self.service);
        let request = InstallRequest::for_package(&self.package_id);
        let kwargs =
            serde_json::to_value(&request).map_err(|e| UpdateError::Transport(e.to_string()))?;

        info!(procedure, package = %self.package_id, "requesting core update");
        let reply = router.call(&procedure, Vec::new(), Some(kwargs)).await?;

        // The executor returns its reply as a JSON-encoded string in the
        // first positional result.
        let decoded = reply
            .args
            .first()
            .and_then(Value::as_str)
            .and_then(|raw| InstallResult::decode(raw).ok());
        let Some(result) = decoded else {
            warn!("install reply could not be decoded");
            return Err(UpdateError::App(GENERIC_FAILURE.into()));
        };

        if !result.success {
            return Err(UpdateError::App(
                result.message.unwrap_or_else(|| GENERIC_FAILURE.into()),
            ));
        }
        Ok(())
    }
}
