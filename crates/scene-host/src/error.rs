//! Host-side command failures
//!
//! Display strings are the exact messages that cross the bridge inside error
//! envelopes, so they stay human-readable on the agent side.

use scene_bridge_core::BridgeError;
use thiserror::Error;

/// Domain errors raised by scene command handlers
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Material not found: {0}")]
    MaterialNotFound(String),

    #[error("Modifier not found: {0}")]
    ModifierNotFound(String),

    #[error("Modifier '{name}' is not a geometry nodes modifier (type: {kind})")]
    NotGeometryNodes { name: String, kind: String },

    #[error("Modifier '{0}' has no node group assigned")]
    NoNodeGroup(String),

    #[error("Input not found: '{input}'. Available inputs: {available:?}")]
    InputNotFound {
        input: String,
        available: Vec<String>,
    },

    #[error("Asset library not found: {0}")]
    LibraryNotFound(String),

    #[error("Asset library path does not exist: {0}")]
    LibraryPathMissing(String),

    #[error("No .blend file found for asset: {0}")]
    AssetNotFound(String),

    #[error("Failed to scan asset library: {0}")]
    LibraryScan(String),

    #[error("No 3D viewport found")]
    NoViewport,

    #[error("Code execution is not supported by this host")]
    CodeExecutionUnsupported,

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

impl From<SceneError> for BridgeError {
    fn from(err: SceneError) -> Self {
        BridgeError::Command(err.to_string())
    }
}
