//! Error types for the scene bridge

use std::time::Duration;
use thiserror::Error;

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Bridge error taxonomy
///
/// Communication failures (the transport broke) and command failures (a valid
/// error envelope came back) are distinct variants so callers can tell a dead
/// host apart from a handler saying no.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Could not reach the bridge server
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The whole round trip exceeded the configured deadline
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Peer closed the connection before a complete document accumulated
    #[error("Connection closed before a complete response was received")]
    Disconnected,

    /// Socket I/O failure mid-exchange
    #[error("I/O error: {0}")]
    Io(String),

    /// Wire-format violation
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// JSON encode/decode failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid client or server configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Failure reported by a command handler inside a well-formed error
    /// envelope; the message is the handler's own text
    #[error("{0}")]
    Command(String),
}

impl BridgeError {
    /// True for failures of the transport itself, as opposed to errors a
    /// handler reported through a valid response envelope.
    pub fn is_communication(&self) -> bool {
        matches!(
            self,
            BridgeError::Connect(_)
                | BridgeError::Timeout(_)
                | BridgeError::Disconnected
                | BridgeError::Io(_)
                | BridgeError::Protocol(_)
        )
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn communication_classification() {
        assert!(BridgeError::Connect("refused".into()).is_communication());
        assert!(BridgeError::Timeout(Duration::from_secs(30)).is_communication());
        assert!(BridgeError::Disconnected.is_communication());
        assert!(!BridgeError::Command("Object not found: Cube".into()).is_communication());
        assert!(!BridgeError::Config("port out of range".into()).is_communication());
    }

    #[test]
    fn command_error_displays_bare_message() {
        let err = BridgeError::Command("Unknown command: frobnicate".into());
        assert_eq!(err.to_string(), "Unknown command: frobnicate");
    }
}
