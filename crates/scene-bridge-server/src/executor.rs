//! Serialized command execution against the host state
//!
//! The host permits mutation only from one context. Connection tasks never
//! touch host state; they queue `PendingCommand`s and the executor drains them
//! one at a time, so no two handler bodies ever run concurrently and no handler
//! observes a partially-mutated scene left by another.

use async_trait::async_trait;
use scene_bridge_core::{
    BridgeError, CommandEnvelope, CommandRegistry, ResponseEnvelope, Result,
};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Delivery seam for replies
///
/// The connection task transfers its write half in behind this trait; tests
/// drive the executor with channel-backed writers instead of sockets.
#[async_trait]
pub trait ReplyWriter: Send {
    async fn write_reply(&mut self, data: &[u8]) -> Result<()>;
}

/// Reply writer over the write half transferred from a connection task
pub struct TcpReplyWriter(pub OwnedWriteHalf);

#[async_trait]
impl ReplyWriter for TcpReplyWriter {
    async fn write_reply(&mut self, data: &[u8]) -> Result<()> {
        self.0
            .write_all(data)
            .await
            .map_err(|e| BridgeError::Io(format!("Reply write failed: {e}")))?;
        self.0
            .flush()
            .await
            .map_err(|e| BridgeError::Io(format!("Reply flush failed: {e}")))?;
        Ok(())
    }
}

/// A parsed command plus the handle that delivers its reply
///
/// Created when framing completes, destroyed once the reply is delivered or
/// the delivery attempt is abandoned.
pub struct PendingCommand {
    pub envelope: CommandEnvelope,
    pub reply: Box<dyn ReplyWriter>,
}

/// Clonable submission handle held by connection tasks
#[derive(Clone)]
pub struct CommandQueue {
    tx: mpsc::Sender<PendingCommand>,
}

impl CommandQueue {
    pub async fn submit(&self, pending: PendingCommand) -> Result<()> {
        self.tx
            .send(pending)
            .await
            .map_err(|_| BridgeError::Io("Executor is not running".into()))
    }
}

/// Single consumer of the command queue; the only code that sees `S` mutably
pub struct HostExecutor<S> {
    state: S,
    registry: CommandRegistry<S>,
    queue: mpsc::Receiver<PendingCommand>,
}

impl<S> HostExecutor<S> {
    pub fn new(state: S, registry: CommandRegistry<S>) -> (Self, CommandQueue) {
        let (tx, rx) = mpsc::channel(32);
        (
            Self {
                state,
                registry,
                queue: rx,
            },
            CommandQueue { tx },
        )
    }

    /// Drain everything queued at this instant, without waiting.
    ///
    /// Hosts that own their own cooperative loop call this once per iteration.
    /// Returns how many commands ran.
    pub async fn tick(&mut self) -> usize {
        let mut executed = 0;
        while let Ok(pending) = self.queue.try_recv() {
            self.execute(pending).await;
            executed += 1;
        }
        executed
    }

    /// Standalone drive loop; exits once every submission handle is dropped.
    pub async fn run(mut self) {
        while let Some(pending) = self.queue.recv().await {
            self.execute(pending).await;
        }
        debug!("Command queue closed, executor exiting");
    }

    async fn execute(&mut self, mut pending: PendingCommand) {
        let command = pending.envelope.command.clone();
        let response = self.registry.dispatch(&mut self.state, pending.envelope);

        let data = serde_json::to_vec(&response).or_else(|e| {
            error!("Failed to serialize response for {}: {}", command, e);
            serde_json::to_vec(&ResponseEnvelope::error(format!(
                "Response serialization failed: {e}"
            )))
        });

        match data {
            Ok(data) => {
                if let Err(e) = pending.reply.write_reply(&data).await {
                    // Peer may have timed out and gone away; the command still
                    // ran to completion.
                    debug!("Could not deliver reply for {}: {}", command, e);
                }
            }
            Err(e) => error!("Could not build error reply for {}: {}", command, e),
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use tokio::sync::mpsc::UnboundedSender;

    struct ChannelReplyWriter(UnboundedSender<Vec<u8>>);

    #[async_trait]
    impl ReplyWriter for ChannelReplyWriter {
        async fn write_reply(&mut self, data: &[u8]) -> Result<()> {
            self.0
                .send(data.to_vec())
                .map_err(|_| BridgeError::Io("Reply channel closed".into()))
        }
    }

    struct FailingReplyWriter;

    #[async_trait]
    impl ReplyWriter for FailingReplyWriter {
        async fn write_reply(&mut self, _data: &[u8]) -> Result<()> {
            Err(BridgeError::Io("Peer already gone".into()))
        }
    }

    fn log_registry() -> CommandRegistry<Vec<String>> {
        let mut registry = CommandRegistry::new();
        registry.register("append", |log: &mut Vec<String>, params: Value| {
            let tag = params
                .get("tag")
                .and_then(Value::as_str)
                .unwrap_or("?")
                .to_string();
            log.push(tag.clone());
            Ok(json!({ "tag": tag, "seen": log.len() }))
        });
        registry.register("explode", |_log, _params| {
            Err(BridgeError::Command("Forced failure".into()))
        });
        registry
    }

    fn pending(command: &str, params: Value, tx: &UnboundedSender<Vec<u8>>) -> PendingCommand {
        PendingCommand {
            envelope: CommandEnvelope::new(command, params),
            reply: Box::new(ChannelReplyWriter(tx.clone())),
        }
    }

    #[tokio::test]
    async fn tick_drains_queued_commands_in_order() {
        let (mut executor, queue) = HostExecutor::new(Vec::new(), log_registry());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        queue
            .submit(pending("append", json!({ "tag": "a" }), &tx))
            .await
            .unwrap();
        queue
            .submit(pending("append", json!({ "tag": "b" }), &tx))
            .await
            .unwrap();

        assert_eq!(executor.tick().await, 2);
        assert_eq!(executor.state().as_slice(), ["a", "b"]);

        // Each reply reflects the state after its own command: no interleaving
        let first: ResponseEnvelope = serde_json::from_slice(&rx.recv().await.unwrap()).unwrap();
        let second: ResponseEnvelope = serde_json::from_slice(&rx.recv().await.unwrap()).unwrap();
        match (first, second) {
            (
                ResponseEnvelope::Success { result: a },
                ResponseEnvelope::Success { result: b },
            ) => {
                assert_eq!(a["seen"], 1);
                assert_eq!(b["seen"], 2);
            }
            _ => panic!("Expected two success envelopes"),
        }
    }

    #[tokio::test]
    async fn tick_with_empty_queue_is_a_noop() {
        let (mut executor, _queue) = HostExecutor::new(Vec::new(), log_registry());
        assert_eq!(executor.tick().await, 0);
    }

    #[tokio::test]
    async fn handler_error_becomes_error_envelope() {
        let (mut executor, queue) = HostExecutor::new(Vec::new(), log_registry());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        queue
            .submit(pending("explode", json!({}), &tx))
            .await
            .unwrap();
        executor.tick().await;

        match serde_json::from_slice(&rx.recv().await.unwrap()).unwrap() {
            ResponseEnvelope::Error { message } => assert_eq!(message, "Forced failure"),
            _ => panic!("Expected error envelope"),
        }
    }

    #[tokio::test]
    async fn failed_delivery_does_not_stall_later_commands() {
        let (mut executor, queue) = HostExecutor::new(Vec::new(), log_registry());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        queue
            .submit(PendingCommand {
                envelope: CommandEnvelope::new("append", json!({ "tag": "lost" })),
                reply: Box::new(FailingReplyWriter),
            })
            .await
            .unwrap();
        queue
            .submit(pending("append", json!({ "tag": "kept" }), &tx))
            .await
            .unwrap();

        assert_eq!(executor.tick().await, 2);

        // The abandoned command still executed before the next one
        assert_eq!(executor.state().as_slice(), ["lost", "kept"]);
        let reply: ResponseEnvelope = serde_json::from_slice(&rx.recv().await.unwrap()).unwrap();
        match reply {
            ResponseEnvelope::Success { result } => assert_eq!(result["tag"], "kept"),
            _ => panic!("Expected success envelope"),
        }
    }
}
