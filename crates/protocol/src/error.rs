//! Protocol error types and router call-error normalization.

use serde_json::Value;

/// Errors from encoding or decoding WAMP frames.
#[derive(Debug, thiserror::Error)]
pub enum WampError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed frame: {0}")]
    Malformed(&'static str),

    #[error("unknown message code {0}")]
    UnknownCode(u64),
}

/// A call rejection from the router, reduced to the fields the client
/// reports from.
///
/// Routers return errors in several shapes, so user-facing text is
/// extracted through a fixed priority list rather than by probing
/// arbitrary fields. See [`CallError::normalized`].
#[derive(Debug, Clone, PartialEq)]
pub struct CallError {
    /// WAMP error URI, e.g. `wamp.error.runtime_error`.
    pub error: String,
    /// Positional error arguments.
    pub args: Vec<Value>,
    /// Direct message, when the router includes one in the error kwargs.
    pub message: Option<String>,
}

impl CallError {
    /// Builds a call error from the parts of a WAMP ERROR frame.
    pub fn new(error: impl Into<String>, args: Vec<Value>, kwargs: Option<&Value>) -> Self {
        let message = kwargs
            .and_then(|k| k.get("message"))
            .and_then(Value::as_str)
            .map(str::to_owned);
        Self {
            error: error.into(),
            args,
            message,
        }
    }

    /// Reduces the error to one user-facing text.
    ///
    /// Priority: the direct `message` field, then the first positional
    /// argument, then the error URI.
    pub fn normalized(&self) -> String {
        if let Some(message) = &self.message
            && !message.is_empty()
        {
            return message.clone();
        }
        if let Some(first) = self.args.first() {
            return match first.as_str() {
                Some(s) => s.to_owned(),
                None => first.to_string(),
            };
        }
        self.error.clone()
    }
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_prefers_direct_message() {
        let err = CallError::new(
            "wamp.error.runtime_error",
            vec![json!("arg text")],
            Some(&json!({"message": "direct text"})),
        );
        assert_eq!(err.normalized(), "direct text");
    }

    #[test]
    fn normalize_falls_back_to_first_arg() {
        let err = CallError::new("wamp.error.runtime_error", vec![json!("arg text")], None);
        assert_eq!(err.normalized(), "arg text");
    }

    #[test]
    fn normalize_stringifies_non_text_arg() {
        let err = CallError::new("wamp.error.runtime_error", vec![json!(42)], None);
        assert_eq!(err.normalized(), "42");
    }

    #[test]
    fn normalize_falls_back_to_error_uri() {
        let err = CallError::new("E", vec![], None);
        assert_eq!(err.normalized(), "E");
    }

    #[test]
    fn empty_direct_message_is_skipped() {
        let err = CallError::new(
            "wamp.error.runtime_error",
            vec![json!("arg text")],
            Some(&json!({"message": ""})),
        );
        assert_eq!(err.normalized(), "arg text");
    }

    #[test]
    fn kwargs_without_message_field() {
        let err = CallError::new("uri", vec![], Some(&json!({"detail": "x"})));
        assert_eq!(err.message, None);
        assert_eq!(err.normalized(), "uri");
    }
}
