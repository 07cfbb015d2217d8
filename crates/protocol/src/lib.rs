//! Wire protocol types for the coreup router client.
//!
//! Implements the subset of WAMP (JSON serialization) the client speaks:
//! session establishment, topic subscription, and RPC calls. Frames are
//! JSON arrays with a numeric message code in the first position.

pub mod constants;
pub mod error;
pub mod frame;
pub mod messages;

pub use constants::{install_procedure, log_topic};
pub use error::{CallError, WampError};
pub use frame::{CallReply, Frame};
pub use messages::{InstallRequest, InstallResult, ProgressEnvelope, ProgressLog};
