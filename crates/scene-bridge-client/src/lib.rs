//! # scene-bridge-client
//!
//! Client half of the scene bridge. Every call opens a fresh TCP connection,
//! sends exactly one command envelope, and awaits the single reply; there is no
//! pooling and no keep-alive. The whole round trip is bounded by the configured
//! timeout, and because the sockets are async the caller's own scheduling loop
//! is never stalled while a command is in flight.

use scene_bridge_core::{
    BridgeError, ClientConfig, CommandEnvelope, ResponseEnvelope, Result, try_frame,
};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

const READ_CHUNK: usize = 8192;

/// Client for issuing commands to a running bridge server
pub struct BridgeClient {
    config: ClientConfig,
}

impl BridgeClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Resolve host and port from `SCENE_BRIDGE_HOST` / `SCENE_BRIDGE_PORT`
    pub fn from_env() -> Self {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send one command and await its reply.
    ///
    /// A `status: "error"` reply surfaces as [`BridgeError::Command`] carrying
    /// the envelope's message; everything else that can go wrong is a
    /// communication failure (see [`BridgeError::is_communication`]).
    pub async fn send_command(&self, command: &str, params: Value) -> Result<Value> {
        tokio::time::timeout(self.config.timeout, self.round_trip(command, params))
            .await
            .map_err(|_| BridgeError::Timeout(self.config.timeout))?
    }

    async fn round_trip(&self, command: &str, params: Value) -> Result<Value> {
        let addr = self.config.addr();
        let mut stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| BridgeError::Connect(format!("Failed to connect to {addr}: {e}")))?;
        stream
            .set_nodelay(true)
            .map_err(|e| BridgeError::Io(format!("Failed to set TCP_NODELAY: {e}")))?;

        let envelope = CommandEnvelope::new(command, params);
        let data = serde_json::to_vec(&envelope)?;
        debug!("[agent→host] {} ({} bytes)", command, data.len());

        stream
            .write_all(&data)
            .await
            .map_err(|e| BridgeError::Io(format!("Write failed: {e}")))?;
        stream
            .flush()
            .await
            .map_err(|e| BridgeError::Io(format!("Flush failed: {e}")))?;

        // Mirror the server's framing policy: accumulate chunks and attempt a
        // parse after each one.
        let mut buffer = Vec::with_capacity(READ_CHUNK);
        let mut chunk = [0u8; READ_CHUNK];
        let response = loop {
            let n = stream
                .read(&mut chunk)
                .await
                .map_err(|e| BridgeError::Io(format!("Read failed: {e}")))?;
            if n == 0 {
                return Err(BridgeError::Disconnected);
            }
            buffer.extend_from_slice(&chunk[..n]);
            if let Some(response) = try_frame::<ResponseEnvelope>(&buffer) {
                break response;
            }
        };

        debug!("[host→agent] {} replied ({} bytes)", command, buffer.len());

        match response {
            ResponseEnvelope::Success { result } => Ok(result),
            ResponseEnvelope::Error { message } => Err(BridgeError::Command(message)),
        }
    }

    // --- Typed command surface ---

    /// Scene name, object count, first objects, material count
    pub async fn get_scene_info(&self) -> Result<Value> {
        self.send_command("get_scene_info", json!({})).await
    }

    /// Transform, visibility, materials, and mesh stats for one object
    pub async fn get_object_info(&self, name: &str) -> Result<Value> {
        self.send_command("get_object_info", json!({ "name": name }))
            .await
    }

    /// Viewport capture, largest dimension bounded by `max_size` pixels
    pub async fn get_viewport_screenshot(&self, max_size: u32) -> Result<Value> {
        self.send_command("get_viewport_screenshot", json!({ "max_size": max_size }))
            .await
    }

    /// Run a script inside the host, where the host supports it
    pub async fn execute_code(&self, code: &str) -> Result<Value> {
        self.send_command("execute_code", json!({ "code": code }))
            .await
    }

    pub async fn get_asset_libraries(&self) -> Result<Value> {
        self.send_command("get_asset_libraries", json!({})).await
    }

    pub async fn list_assets(
        &self,
        library_name: &str,
        search: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Value> {
        self.send_command(
            "list_assets",
            json!({
                "library_name": library_name,
                "search": search,
                "offset": offset,
                "limit": limit,
            }),
        )
        .await
    }

    pub async fn append_asset(
        &self,
        library_name: &str,
        asset_name: &str,
        location: [f64; 3],
    ) -> Result<Value> {
        self.send_command(
            "append_asset",
            json!({
                "library_name": library_name,
                "asset_name": asset_name,
                "location": location,
            }),
        )
        .await
    }

    pub async fn get_modifiers(&self, object_name: &str) -> Result<Value> {
        self.send_command("get_modifiers", json!({ "object_name": object_name }))
            .await
    }

    pub async fn add_modifier(
        &self,
        object_name: &str,
        modifier_type: &str,
        modifier_name: Option<&str>,
        properties: Option<Value>,
    ) -> Result<Value> {
        let mut params = json!({
            "object_name": object_name,
            "modifier_type": modifier_type,
        });
        if let Some(name) = modifier_name {
            params["modifier_name"] = json!(name);
        }
        if let Some(properties) = properties {
            params["properties"] = properties;
        }
        self.send_command("add_modifier", params).await
    }

    pub async fn remove_modifier(&self, object_name: &str, modifier_name: &str) -> Result<Value> {
        self.send_command(
            "remove_modifier",
            json!({ "object_name": object_name, "modifier_name": modifier_name }),
        )
        .await
    }

    /// Bake a modifier into the mesh
    pub async fn apply_modifier(&self, object_name: &str, modifier_name: &str) -> Result<Value> {
        self.send_command(
            "apply_modifier",
            json!({ "object_name": object_name, "modifier_name": modifier_name }),
        )
        .await
    }

    /// Set a geometry nodes input by socket identifier or display name
    pub async fn set_geometry_nodes_input(
        &self,
        object_name: &str,
        modifier_name: &str,
        input_name: &str,
        value: Value,
    ) -> Result<Value> {
        self.send_command(
            "set_geometry_nodes_input",
            json!({
                "object_name": object_name,
                "modifier_name": modifier_name,
                "input_name": input_name,
                "value": value,
            }),
        )
        .await
    }
}

impl Default for BridgeClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::net::TcpListener;

    /// One-shot server that reads the command and replies with canned bytes,
    /// optionally split across two writes
    async fn canned_server(reply: &'static [u8], split: bool) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = vec![0u8; 8192];
                let _ = stream.read(&mut buf).await;
                if split {
                    let mid = reply.len() / 2;
                    let _ = stream.write_all(&reply[..mid]).await;
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    let _ = stream.write_all(&reply[mid..]).await;
                } else {
                    let _ = stream.write_all(reply).await;
                }
            }
        });
        addr
    }

    fn client_for(addr: SocketAddr, timeout: Duration) -> BridgeClient {
        BridgeClient::new(ClientConfig {
            host: addr.ip().to_string(),
            port: addr.port(),
            timeout,
        })
    }

    #[tokio::test]
    async fn success_envelope_returns_result() {
        let addr = canned_server(
            br#"{"status":"success","result":{"name":"Scene","object_count":3}}"#,
            false,
        )
        .await;
        let client = client_for(addr, Duration::from_secs(2));

        let result = client.get_scene_info().await.unwrap();
        assert_eq!(result["name"], "Scene");
        assert_eq!(result["object_count"], 3);
    }

    #[tokio::test]
    async fn error_envelope_surfaces_as_command_error() {
        let addr = canned_server(
            br#"{"status":"error","message":"Object not found: Cube"}"#,
            false,
        )
        .await;
        let client = client_for(addr, Duration::from_secs(2));

        let err = client.get_object_info("Cube").await.unwrap_err();
        assert!(!err.is_communication());
        assert_eq!(err.to_string(), "Object not found: Cube");
    }

    #[tokio::test]
    async fn split_response_is_buffered_until_it_frames() {
        let addr = canned_server(br#"{"status":"success","result":{"applied":"Bevel"}}"#, true).await;
        let client = client_for(addr, Duration::from_secs(2));

        let result = client.apply_modifier("Cube", "Bevel").await.unwrap();
        assert_eq!(result["applied"], "Bevel");
    }

    #[tokio::test]
    async fn connection_refused_is_a_communication_error() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(addr, Duration::from_secs(2));
        let err = client.get_scene_info().await.unwrap_err();
        assert!(err.is_communication());
        assert!(matches!(err, BridgeError::Connect(_)));
    }

    #[tokio::test]
    async fn close_without_document_is_a_communication_error() {
        let addr = canned_server(b"", false).await;
        let client = client_for(addr, Duration::from_secs(2));

        let err = client.get_scene_info().await.unwrap_err();
        assert!(err.is_communication());
        assert!(matches!(err, BridgeError::Disconnected));
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = vec![0u8; 8192];
                let _ = stream.read(&mut buf).await;
                // Hold the connection open without ever replying
                tokio::time::sleep(Duration::from_secs(10)).await;
            }
        });

        let client = client_for(addr, Duration::from_millis(100));
        let err = client.get_scene_info().await.unwrap_err();
        assert!(err.is_communication());
        assert!(matches!(err, BridgeError::Timeout(_)));
    }
}
