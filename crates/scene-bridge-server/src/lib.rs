//! # scene-bridge-server
//!
//! Server half of the scene bridge.
//!
//! This crate provides:
//! - `BridgeServer`: a listener handle with bounded-latency shutdown
//! - Per-connection framing (one JSON document per connection)
//! - `HostExecutor`: a single-consumer command queue serializing every handler
//!   onto the one context allowed to mutate the host state

mod connection;
pub mod executor;
pub mod listener;

pub use executor::{CommandQueue, HostExecutor, PendingCommand, ReplyWriter, TcpReplyWriter};
pub use listener::BridgeServer;
