//! WAMP frame codec.
//!
//! Every frame is a JSON array whose first element is a numeric message
//! code. Only the frames this client sends or receives are modelled;
//! anything else decodes to [`WampError::UnknownCode`].

use serde_json::{Value, json};

use crate::constants::msg_code;
use crate::error::WampError;

/// A decoded WAMP frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// `[1, realm, details]` — opens a session.
    Hello { realm: String, details: Value },
    /// `[2, session_id, details]` — session established.
    Welcome { session_id: u64, details: Value },
    /// `[3, details, reason]` — router refused the session.
    Abort { details: Value, reason: String },
    /// `[6, details, reason]` — orderly session close.
    Goodbye { details: Value, reason: String },
    /// `[8, request_type, request_id, details, error, args?, kwargs?]`.
    Error {
        request_type: u64,
        request_id: u64,
        details: Value,
        error: String,
        args: Vec<Value>,
        kwargs: Option<Value>,
    },
    /// `[32, request_id, options, topic]`.
    Subscribe {
        request_id: u64,
        options: Value,
        topic: String,
    },
    /// `[33, request_id, subscription_id]`.
    Subscribed {
        request_id: u64,
        subscription_id: u64,
    },
    /// `[36, subscription_id, publication_id, details, args?, kwargs?]`.
    Event {
        subscription_id: u64,
        publication_id: u64,
        details: Value,
        args: Vec<Value>,
        kwargs: Option<Value>,
    },
    /// `[48, request_id, options, procedure, args?, kwargs?]`.
    Call {
        request_id: u64,
        options: Value,
        procedure: String,
        args: Vec<Value>,
        kwargs: Option<Value>,
    },
    /// `[50, request_id, details, args?, kwargs?]`.
    Result {
        request_id: u64,
        details: Value,
        args: Vec<Value>,
        kwargs: Option<Value>,
    },
}

/// Positional and keyword results of a completed call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallReply {
    pub args: Vec<Value>,
    pub kwargs: Option<Value>,
}

impl Frame {
    /// Serializes the frame to its JSON array wire form.
    pub fn encode(&self) -> Result<String, WampError> {
        let arr = match self {
            Frame::Hello { realm, details } => {
                vec![json!(msg_code::HELLO), json!(realm), details.clone()]
            }
            Frame::Welcome {
                session_id,
                details,
            } => vec![json!(msg_code::WELCOME), json!(session_id), details.clone()],
            Frame::Abort { details, reason } => {
                vec![json!(msg_code::ABORT), details.clone(), json!(reason)]
            }
            Frame::Goodbye { details, reason } => {
                vec![json!(msg_code::GOODBYE), details.clone(), json!(reason)]
            }
            Frame::Error {
                request_type,
                request_id,
                details,
                error,
                args,
                kwargs,
            } => {
                let mut arr = vec![
                    json!(msg_code::ERROR),
                    json!(request_type),
                    json!(request_id),
                    details.clone(),
                    json!(error),
                ];
                push_payload(&mut arr, args, kwargs);
                arr
            }
            Frame::Subscribe {
                request_id,
                options,
                topic,
            } => vec![
                json!(msg_code::SUBSCRIBE),
                json!(request_id),
                options.clone(),
                json!(topic),
            ],
            Frame::Subscribed {
                request_id,
                subscription_id,
            } => vec![
                json!(msg_code::SUBSCRIBED),
                json!(request_id),
                json!(subscription_id),
            ],
            Frame::Event {
                subscription_id,
                publication_id,
                details,
                args,
                kwargs,
            } => {
                let mut arr = vec![
                    json!(msg_code::EVENT),
                    json!(subscription_id),
                    json!(publication_id),
                    details.clone(),
                ];
                push_payload(&mut arr, args, kwargs);
                arr
            }
            Frame::Call {
                request_id,
                options,
                procedure,
                args,
                kwargs,
            } => {
                let mut arr = vec![
                    json!(msg_code::CALL),
                    json!(request_id),
                    options.clone(),
                    json!(procedure),
                ];
                push_payload(&mut arr, args, kwargs);
                arr
            }
            Frame::Result {
                request_id,
                details,
                args,
                kwargs,
            } => {
                let mut arr = vec![json!(msg_code::RESULT), json!(request_id), details.clone()];
                push_payload(&mut arr, args, kwargs);
                arr
            }
        };
        Ok(serde_json::to_string(&arr)?)
    }

    /// Parses a frame from its JSON array wire form.
    pub fn decode(text: &str) -> Result<Self, WampError> {
        let arr: Vec<Value> = serde_json::from_str(text)?;
        let code = arr
            .first()
            .and_then(Value::as_u64)
            .ok_or(WampError::Malformed("missing message code"))?;

        let frame = match code {
            msg_code::HELLO => Frame::Hello {
                realm: str_at(&arr, 1)?,
                details: obj_at(&arr, 2),
            },
            msg_code::WELCOME => Frame::Welcome {
                session_id: u64_at(&arr, 1)?,
                details: obj_at(&arr, 2),
            },
            msg_code::ABORT => Frame::Abort {
                details: obj_at(&arr, 1),
                reason: str_at(&arr, 2)?,
            },
            msg_code::GOODBYE => Frame::Goodbye {
                details: obj_at(&arr, 1),
                reason: str_at(&arr, 2)?,
            },
            msg_code::ERROR => Frame::Error {
                request_type: u64_at(&arr, 1)?,
                request_id: u64_at(&arr, 2)?,
                details: obj_at(&arr, 3),
                error: str_at(&arr, 4)?,
                args: args_at(&arr, 5),
                kwargs: kwargs_at(&arr, 6),
            },
            msg_code::SUBSCRIBE => Frame::Subscribe {
                request_id: u64_at(&arr, 1)?,
                options: obj_at(&arr, 2),
                topic: str_at(&arr, 3)?,
            },
            msg_code::SUBSCRIBED => Frame::Subscribed {
                request_id: u64_at(&arr, 1)?,
                subscription_id: u64_at(&arr, 2)?,
            },
            msg_code::EVENT => Frame::Event {
                subscription_id: u64_at(&arr, 1)?,
                publication_id: u64_at(&arr, 2)?,
                details: obj_at(&arr, 3),
                args: args_at(&arr, 4),
                kwargs: kwargs_at(&arr, 5),
            },
            msg_code::CALL => Frame::Call {
                request_id: u64_at(&arr, 1)?,
                options: obj_at(&arr, 2),
                procedure: str_at(&arr, 3)?,
                args: args_at(&arr, 4),
                kwargs: kwargs_at(&arr, 5),
            },
            msg_code::RESULT => Frame::Result {
                request_id: u64_at(&arr, 1)?,
                details: obj_at(&arr, 2),
                args: args_at(&arr, 3),
                kwargs: kwargs_at(&arr, 4),
            },
            other => return Err(WampError::UnknownCode(other)),
        };
        Ok(frame)
    }
}

/// Appends `args`/`kwargs` to a frame. Kwargs require args to be present,
/// so an empty args list is still emitted when kwargs follow.
fn push_payload(arr: &mut Vec<Value>, args: &[Value], kwargs: &Option<Value>) {
    match kwargs {
        Some(kw) => {
            arr.push(json!(args));
            arr.push(kw.clone());
        }
        None if !args.is_empty() => arr.push(json!(args)),
        None => {}
    }
}

fn u64_at(arr: &[Value], idx: usize) -> Result<u64, WampError> {
    arr.get(idx)
        .and_then(Value::as_u64)
        .ok_or(WampError::Malformed("expected integer element"))
}

fn str_at(arr: &[Value], idx: usize) -> Result<String, WampError> {
    arr.get(idx)
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(WampError::Malformed("expected string element"))
}

/// Details/options objects are optional on the wire; absent becomes `{}`.
fn obj_at(arr: &[Value], idx: usize) -> Value {
    match arr.get(idx) {
        Some(v) if v.is_object() => v.clone(),
        _ => json!({}),
    }
}

fn args_at(arr: &[Value], idx: usize) -> Vec<Value> {
    match arr.get(idx) {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

fn kwargs_at(arr: &[Value], idx: usize) -> Option<Value> {
    match arr.get(idx) {
        Some(v) if v.is_object() => Some(v.clone()),
        _ => None,
    }
}
