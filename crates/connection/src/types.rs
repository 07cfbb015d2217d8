//! Public types for the connection manager.

/// Connection lifecycle state.
///
/// The state only ever moves forward: `Unopened → Open → Closed`. A
/// closed connection is never reopened; the host creates a new
/// [`ConnectionManager`](crate::ConnectionManager) instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created, `open()` not yet completed.
    Unopened,
    /// Session established with the router.
    Open,
    /// Connection failed, lost, or shut down.
    Closed,
}

/// Why the connection closed (or never opened).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Transport negotiation failed in a way that indicates a
    /// protocol/security mismatch: a URL scheme this client cannot
    /// speak, or a rejected WebSocket upgrade. The host shows
    /// mixed-content remediation for exactly this case.
    Unsupported,
    /// The router refused the session during the WAMP handshake.
    Aborted { reason: String },
    /// An established connection was lost.
    Lost,
    /// Any other failure.
    Other(String),
}

impl CloseReason {
    /// True when the close is the mixed-content case the host must
    /// explain to the user.
    pub fn is_mixed_content(&self) -> bool {
        matches!(self, CloseReason::Unsupported)
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::Unsupported => f.write_str("unsupported"),
            CloseReason::Aborted { reason } => write!(f, "aborted: {reason}"),
            CloseReason::Lost => f.write_str("connection lost"),
            CloseReason::Other(text) => f.write_str(text),
        }
    }
}

/// Router endpoint identity: where to connect and which realm to join.
#[derive(Debug, Clone)]
pub struct RouterEndpoint {
    pub url: String,
    pub realm: String,
}

/// Events emitted by the connection manager.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// Session established with the router.
    Opened { session_id: u64 },
    /// Connection closed, lost, or never established.
    Closed { reason: CloseReason },
}
