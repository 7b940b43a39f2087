//! Listening server: accepts connections and hands them to per-connection tasks
//!
//! The accept loop only dispatches connections; it never parses or executes
//! commands. Shutdown works by polling the accept call with a short timeout and
//! re-checking the running flag on every expiry, so `stop` latency is bounded
//! by one poll interval.

use crate::connection::handle_connection;
use crate::executor::CommandQueue;
use scene_bridge_core::{BridgeError, Result, ServerConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::{TcpListener, TcpSocket};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Handle for a running bridge server
///
/// There is no process-wide state: a `BridgeServer` exists exactly as long as
/// its listener runs, and independent instances can coexist (each bound to its
/// own port). `stop` is idempotent and the port is released before it returns.
pub struct BridgeServer {
    running: Arc<AtomicBool>,
    local_addr: SocketAddr,
    accept_task: Option<JoinHandle<()>>,
    shutdown_grace: Duration,
}

impl BridgeServer {
    /// Bind the configured address and start accepting connections.
    ///
    /// Each accepted connection is framed on its own task and executed through
    /// `queue`. Port 0 binds an ephemeral port; see [`BridgeServer::local_addr`].
    pub async fn start(config: ServerConfig, queue: CommandQueue) -> Result<Self> {
        config.validate()?;

        let listener = bind_listener(&config).await?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| BridgeError::Io(format!("Failed to read local address: {e}")))?;

        let running = Arc::new(AtomicBool::new(true));
        let accept_task = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&running),
            queue,
            config.accept_poll,
        ));

        info!("Bridge server listening on {}", local_addr);
        Ok(Self {
            running,
            local_addr,
            accept_task: Some(accept_task),
            shutdown_grace: config.shutdown_grace,
        })
    }

    /// The bound address; differs from the configured one when port 0 was used
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop accepting and wait for the accept loop to exit.
    ///
    /// Safe to call more than once. The listening socket is closed, and with it
    /// the port released, by the time this returns.
    pub async fn stop(&mut self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }

        if let Some(mut task) = self.accept_task.take() {
            if tokio::time::timeout(self.shutdown_grace, &mut task)
                .await
                .is_err()
            {
                warn!(
                    "Accept loop did not exit within {:?}, aborting",
                    self.shutdown_grace
                );
                task.abort();
                // Wait for the abort so the listener is actually dropped
                let _ = task.await;
            }
        }

        info!("Bridge server on {} stopped", self.local_addr);
    }
}

/// Bind with `SO_REUSEADDR` so a stopped server can restart on the same port
/// without waiting out lingering TIME_WAIT sockets.
async fn bind_listener(config: &ServerConfig) -> Result<TcpListener> {
    let addr = tokio::net::lookup_host(config.addr())
        .await
        .map_err(|e| BridgeError::Connect(format!("Failed to resolve {}: {}", config.addr(), e)))?
        .next()
        .ok_or_else(|| BridgeError::Config(format!("No address for {}", config.addr())))?;

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .map_err(|e| BridgeError::Io(format!("Failed to create socket: {e}")))?;

    socket
        .set_reuseaddr(true)
        .map_err(|e| BridgeError::Io(format!("Failed to set SO_REUSEADDR: {e}")))?;
    socket
        .bind(addr)
        .map_err(|e| BridgeError::Connect(format!("Failed to bind {addr}: {e}")))?;
    socket
        .listen(128)
        .map_err(|e| BridgeError::Connect(format!("Failed to listen on {addr}: {e}")))
}

async fn accept_loop(
    listener: TcpListener,
    running: Arc<AtomicBool>,
    queue: CommandQueue,
    poll: Duration,
) {
    while running.load(Ordering::Acquire) {
        match tokio::time::timeout(poll, listener.accept()).await {
            // Poll expired; re-check the running flag
            Err(_) => continue,
            Ok(Ok((stream, peer))) => {
                debug!("Client connected from {}", peer);
                tokio::spawn(handle_connection(stream, peer, queue.clone()));
            }
            Ok(Err(e)) => {
                if running.load(Ordering::Acquire) {
                    warn!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }
        }
    }
    debug!("Accept loop exiting");
    // The listener drops here, releasing the port
}
