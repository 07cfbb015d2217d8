//! Router connection management for the coreup client.
//!
//! Provides the WebSocket WAMP client, session establishment, and
//! single-connection lifecycle tracking. There is no automatic
//! reconnection: once a connection closes, the handle is spent and the
//! host must create a fresh manager to connect again.

pub mod manager;
pub(crate) mod pumps;
pub mod router_client;
pub mod types;

pub use manager::ConnectionManager;
pub use router_client::{CallFailure, ConnectError, EventHandler, RouterClient};
pub use types::{CloseReason, ConnectionEvent, ConnectionState, RouterEndpoint};
