//! Update session error types.

use coreup_protocol::CallError;

/// Message shown when a trigger is attempted without an open session.
pub const SESSION_NOT_OPEN: &str = "Session is not open";

/// Fallback message when the executor reports failure without saying why.
pub const GENERIC_FAILURE: &str = "update failed";

/// Errors produced by the update flow.
///
/// The `Display` text of each variant is exactly what lands in
/// [`Status::Failed`](crate::Status::Failed).
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// No open router session when the trigger was attempted.
    #[error("{SESSION_NOT_OPEN}")]
    SessionNotOpen,

    /// The router rejected the call; displays the normalized message.
    #[error("{0}")]
    Rejected(CallError),

    /// The transport failed before a reply arrived.
    #[error("{0}")]
    Transport(String),

    /// The executor replied, but reported failure (or an undecodable
    /// reply). Carries the user-facing message.
    #[error("{0}")]
    App(String),
}
