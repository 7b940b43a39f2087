//! Wire envelopes for bridge requests and responses
//!
//! Both directions carry bare UTF-8 JSON documents with no length prefix or
//! delimiter: a frame is complete the moment the accumulated bytes parse. That
//! only holds together because each connection carries exactly one document in
//! each direction.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Command sent to the host: `{"type": <name>, "params": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// Registry key selecting the handler
    #[serde(rename = "type")]
    pub command: String,
    /// Handler-specific parameters; no schema is enforced at this layer
    #[serde(default = "empty_params")]
    pub params: Value,
}

fn empty_params() -> Value {
    Value::Object(serde_json::Map::new())
}

impl CommandEnvelope {
    pub fn new(command: impl Into<String>, params: Value) -> Self {
        Self {
            command: command.into(),
            params,
        }
    }

    /// Convert a framed JSON document into an envelope.
    ///
    /// Framing completes on any full document, not only well-formed
    /// envelopes; a document with a missing or non-string `type` (or no
    /// object at all) still gets dispatched, carrying the offending value
    /// rendered as text, so the peer receives an `Unknown command` reply
    /// instead of silence.
    pub fn from_document(document: Value) -> Self {
        match document {
            Value::Object(mut fields) => {
                let command = match fields.remove("type") {
                    Some(Value::String(name)) => name,
                    Some(other) => other.to_string(),
                    None => Value::Null.to_string(),
                };
                let params = fields.remove("params").unwrap_or_else(empty_params);
                Self { command, params }
            }
            other => Self {
                command: other.to_string(),
                params: empty_params(),
            },
        }
    }
}

/// Reply produced for every command, tagged by `status`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ResponseEnvelope {
    Success { result: Value },
    Error { message: String },
}

impl ResponseEnvelope {
    pub fn success(result: Value) -> Self {
        ResponseEnvelope::Success { result }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ResponseEnvelope::Error {
            message: message.into(),
        }
    }
}

/// Attempt to frame one complete JSON document out of an accumulating buffer.
///
/// Returns `None` while the bytes do not yet parse; the caller keeps reading
/// until they do or the peer goes away.
pub fn try_frame<T: DeserializeOwned>(buf: &[u8]) -> Option<T> {
    serde_json::from_slice(buf).ok()
}
