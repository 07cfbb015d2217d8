//! Update session for the coreup client.
//!
//! This crate implements the **business logic** of the single core
//! update: the status state machine, the trigger flow, and the
//! reconciliation of progress-log events with the call result. It has
//! no transport dependencies — the host app provides a
//! [`RouterSession`] implementation that bridges to the actual WAMP
//! client, which keeps the flow testable with mocks.

pub mod error;
pub mod router;
pub mod types;
pub mod update;

pub use error::UpdateError;
pub use router::{EventFn, RouterSession};
pub use types::Status;
pub use update::UpdateSession;
