//! Per-connection framing
//!
//! One connection carries exactly one command: buffer chunks until the bytes
//! parse as a JSON document, hand the envelope and the socket's write half to
//! the executor, and stop reading. A peer that disconnects before a complete
//! document accumulates is owed nothing and gets nothing.

use crate::executor::{CommandQueue, PendingCommand, TcpReplyWriter};
use scene_bridge_core::{CommandEnvelope, try_frame};
use serde_json::Value;
use std::net::SocketAddr;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tracing::{debug, warn};

const READ_CHUNK: usize = 8192;

/// Sanity cap; a buffer past this point is never going to frame
const MAX_COMMAND_BYTES: usize = 16 * 1024 * 1024;

pub(crate) async fn handle_connection(stream: TcpStream, peer: SocketAddr, queue: CommandQueue) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY for {}: {}", peer, e);
    }

    let (mut read_half, write_half) = stream.into_split();
    let mut buffer = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let n = match read_half.read(&mut chunk).await {
            Ok(0) => {
                debug!(
                    "Connection {} closed with no complete command ({} bytes buffered)",
                    peer,
                    buffer.len()
                );
                return;
            }
            Ok(n) => n,
            Err(e) => {
                debug!("Read error from {}: {}", peer, e);
                return;
            }
        };

        buffer.extend_from_slice(&chunk[..n]);

        // Frame on any complete document, then convert: a parseable but
        // malformed envelope is dispatched anyway so the peer gets an error
        // reply rather than waiting out its timeout.
        if let Some(document) = try_frame::<Value>(&buffer) {
            let envelope = CommandEnvelope::from_document(document);
            debug!(
                "Framed {} command from {} ({} bytes)",
                envelope.command,
                peer,
                buffer.len()
            );
            // The read half is consumed here; from this point only the
            // executor touches this socket, through the transferred write half.
            let pending = PendingCommand {
                envelope,
                reply: Box::new(TcpReplyWriter(write_half)),
            };
            if queue.submit(pending).await.is_err() {
                warn!("Dropping command from {}: executor is not running", peer);
            }
            return;
        }

        if buffer.len() > MAX_COMMAND_BYTES {
            warn!(
                "Dropping connection {}: command exceeds {} bytes",
                peer, MAX_COMMAND_BYTES
            );
            return;
        }
    }
}
