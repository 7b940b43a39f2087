//! Command registry and dispatch boundary
//!
//! Every failure a handler raises is converted into an error envelope here and
//! never propagates further: one bad command must not take down the connection
//! it arrived on, the accept loop, or the executor serving everyone else.

use crate::envelope::{CommandEnvelope, ResponseEnvelope};
use crate::error::Result;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Handler bound to one command name, run against the host state
pub type Handler<S> = Box<dyn FnMut(&mut S, Value) -> Result<Value> + Send>;

/// Name to handler lookup for the registered command surface
pub struct CommandRegistry<S> {
    handlers: HashMap<String, Handler<S>>,
}

impl<S> CommandRegistry<S> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Bind `name` to `handler`. Re-registering a name replaces the previous
    /// binding.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: FnMut(&mut S, Value) -> Result<Value> + Send + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered command names, sorted for stable listings
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve the command name and run its handler against `state`.
    ///
    /// An unknown name is a normal outcome, answered with an error envelope
    /// naming the type. Handler errors are caught and converted the same way.
    pub fn dispatch(&mut self, state: &mut S, envelope: CommandEnvelope) -> ResponseEnvelope {
        let Some(handler) = self.handlers.get_mut(&envelope.command) else {
            warn!("Unknown command: {}", envelope.command);
            return ResponseEnvelope::error(format!("Unknown command: {}", envelope.command));
        };

        debug!("Dispatching {}", envelope.command);
        match handler(state, envelope.params) {
            Ok(result) => ResponseEnvelope::success(result),
            Err(err) => {
                debug!("Command {} failed: {}", envelope.command, err);
                ResponseEnvelope::error(err.to_string())
            }
        }
    }
}

impl<S> Default for CommandRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;
    use serde_json::json;

    fn counting_registry() -> CommandRegistry<u32> {
        let mut registry = CommandRegistry::new();
        registry.register("increment", |count: &mut u32, params| {
            let by = params.get("by").and_then(Value::as_u64).unwrap_or(1) as u32;
            *count += by;
            Ok(json!({ "count": *count }))
        });
        registry.register("always_fails", |_count, _params| {
            Err(BridgeError::Command("Object not found: Cube".into()))
        });
        registry
    }

    #[test]
    fn dispatch_wraps_handler_result() {
        let mut registry = counting_registry();
        let mut count = 0;
        let response = registry.dispatch(
            &mut count,
            CommandEnvelope::new("increment", json!({ "by": 3 })),
        );
        match response {
            ResponseEnvelope::Success { result } => assert_eq!(result["count"], 3),
            _ => panic!("Expected success envelope"),
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn unknown_command_names_the_type() {
        let mut registry = counting_registry();
        let mut count = 0;
        let response = registry.dispatch(&mut count, CommandEnvelope::new("frobnicate", json!({})));
        match response {
            ResponseEnvelope::Error { message } => {
                assert_eq!(message, "Unknown command: frobnicate");
            }
            _ => panic!("Expected error envelope"),
        }
        // No handler ran
        assert_eq!(count, 0);
    }

    #[test]
    fn handler_error_is_contained() {
        let mut registry = counting_registry();
        let mut count = 0;

        let response =
            registry.dispatch(&mut count, CommandEnvelope::new("always_fails", json!({})));
        match response {
            ResponseEnvelope::Error { message } => assert_eq!(message, "Object not found: Cube"),
            _ => panic!("Expected error envelope"),
        }

        // The failure does not affect subsequent commands
        let response = registry.dispatch(&mut count, CommandEnvelope::new("increment", json!({})));
        assert!(matches!(response, ResponseEnvelope::Success { .. }));
        assert_eq!(count, 1);
    }

    #[test]
    fn names_are_sorted() {
        let registry = counting_registry();
        assert_eq!(registry.names(), vec!["always_fails", "increment"]);
        assert!(registry.contains("increment"));
        assert!(!registry.contains("frobnicate"));
    }
}
