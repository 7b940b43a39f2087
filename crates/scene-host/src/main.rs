//! scene-hostd: standalone scene host
//!
//! Runs the in-memory scene graph behind a bridge server so agent processes
//! can connect over TCP. Usage: `scene-hostd [port] [library_name=path]...`

use anyhow::Result;
use scene_bridge_core::{CommandRegistry, ServerConfig};
use scene_bridge_server::{BridgeServer, HostExecutor};
use scene_host::{SceneHost, register_commands};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Log to stderr so stdout stays free for whatever supervises the daemon
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = ServerConfig::default();
    let mut host = SceneHost::default_startup();
    for arg in std::env::args().skip(1) {
        match arg.split_once('=') {
            Some((name, path)) => host.add_asset_library(name, path),
            None => config.port = arg.parse()?,
        }
    }

    let mut registry = CommandRegistry::new();
    register_commands(&mut registry);

    let (executor, queue) = HostExecutor::new(host, registry);
    let executor_task = tokio::spawn(executor.run());

    let mut server = BridgeServer::start(config, queue).await?;
    info!("scene-hostd listening on {}", server.local_addr());

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    server.stop().await;
    executor_task.abort();

    Ok(())
}
