//! Protocol constants shared by the client, the transport, and tests.

use std::time::Duration;

/// WebSocket subprotocol announced during the upgrade handshake.
pub const WAMP_SUBPROTOCOL: &str = "wamp.2.json";

/// Maximum accepted WebSocket message size (4 MiB).
pub const WS_MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

/// Interval between keepalive pings.
pub const WS_PING_PERIOD: Duration = Duration::from_secs(20);

/// How long the read pump tolerates silence before declaring the
/// connection dead. Any incoming frame resets the deadline.
pub const WS_PONG_WAIT: Duration = Duration::from_secs(60);

/// WAMP message type codes (first element of every frame).
pub mod msg_code {
    pub const HELLO: u64 = 1;
    pub const WELCOME: u64 = 2;
    pub const ABORT: u64 = 3;
    pub const GOODBYE: u64 = 6;
    pub const ERROR: u64 = 8;
    pub const SUBSCRIBE: u64 = 32;
    pub const SUBSCRIBED: u64 = 33;
    pub const EVENT: u64 = 36;
    pub const CALL: u64 = 48;
    pub const RESULT: u64 = 50;
}

/// Goodbye reason sent when acknowledging a router-initiated close.
pub const GOODBYE_AND_OUT: &str = "wamp.close.goodbye_and_out";

/// Formats the install procedure name for a service.
pub fn install_procedure(service: &str) -> String {
    format!("installPackage.{service}")
}

/// Formats the progress log topic for a service.
pub fn log_topic(service: &str) -> String {
    format!("log.{service}")
}
