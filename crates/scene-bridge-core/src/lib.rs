//! # scene-bridge-core
//!
//! Core types for the scene bridge protocol.
//!
//! This crate provides the pieces shared by the client and server halves:
//! - Command and response envelopes plus the JSON framing helper
//! - The command registry and dispatch boundary
//! - The bridge error taxonomy
//! - Client and server configuration

pub mod config;
pub mod envelope;
pub mod error;
pub mod registry;

pub use config::{ClientConfig, DEFAULT_HOST, DEFAULT_PORT, ServerConfig};
pub use envelope::{CommandEnvelope, ResponseEnvelope, try_frame};
pub use error::{BridgeError, Result};
pub use registry::CommandRegistry;
