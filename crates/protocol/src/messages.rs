//! Domain payloads carried inside WAMP frames.

use serde::{Deserialize, Serialize};

/// Fixed kwargs payload for the install call.
///
/// The executor addresses packages by the same identifier in both `id`
/// and `name`; `BYPASS_RESOLVER` skips dependency resolution so a core
/// update cannot be blocked by an unsolvable dependency graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallRequest {
    pub id: String,
    pub name: String,
    pub options: InstallOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallOptions {
    #[serde(rename = "BYPASS_RESOLVER")]
    pub bypass_resolver: bool,
}

impl InstallRequest {
    /// Builds the install payload for a package.
    pub fn for_package(package_id: &str) -> Self {
        Self {
            id: package_id.to_owned(),
            name: package_id.to_owned(),
            options: InstallOptions {
                bypass_resolver: true,
            },
        }
    }
}

/// Decoded install call reply.
///
/// The executor returns its reply as a JSON-encoded *string* in the first
/// positional result, so it is decoded in two steps: string out of the
/// frame, then [`InstallResult::decode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl InstallResult {
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// One progress notification from the log topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressLog {
    pub name: String,
    pub message: String,
    #[serde(default)]
    pub clear: bool,
}

impl ProgressLog {
    /// Renders the visible progress line.
    pub fn display_line(&self) -> String {
        format!("{}: {}", self.name, self.message)
    }
}

/// Envelope the publisher wraps progress logs in (event kwargs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEnvelope {
    pub data: ProgressLog,
}
