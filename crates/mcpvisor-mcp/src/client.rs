//! MCP JSON-RPC client over a provider's stdio.
//!
//! Implements the handshake subset of the MCP protocol (JSON-RPC 2.0,
//! newline-delimited): `initialize`, `notifications/initialized`, `ping` and
//! `tools/list`. A background task reads stdout and routes each response to
//! the request waiting for its id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use mcpvisor_core::{HandshakeReport, ProbeFailure, ProviderChannel};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{Mutex, OnceCell, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

/// Protocol revision announced in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Errors that can occur while talking to a provider.
#[derive(Debug, Error)]
pub enum McpClientError {
    #[error("Failed to communicate with provider: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Provider returned error: code={code}, message={message}")]
    Server { code: i64, message: String },

    #[error("Provider closed the connection")]
    Closed,
}

impl From<McpClientError> for ProbeFailure {
    fn from(err: McpClientError) -> Self {
        match err {
            McpClientError::Closed => Self::Exited("connection closed".to_string()),
            other => Self::Handshake(other.to_string()),
        }
    }
}

/// JSON-RPC 2.0 request.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

/// Any JSON-RPC 2.0 message read from the provider.
#[derive(Debug, Deserialize)]
struct JsonRpcMessage {
    #[serde(default)]
    id: Option<Value>,
    /// Set on requests and notifications sent by the provider.
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// MCP initialize result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub server_info: ServerInfo,
    #[serde(default)]
    pub capabilities: ServerCapabilities,
}

/// Server information from initialize.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Server capabilities. Only presence matters here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerCapabilities {
    #[serde(default)]
    pub tools: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ListToolsResult {
    #[serde(default)]
    tools: Vec<ToolSchema>,
}

#[derive(Debug, Deserialize)]
struct ToolSchema {
    name: String,
}

type Reply = Result<Value, McpClientError>;

#[derive(Default)]
struct Pending {
    closed: bool,
    waiters: HashMap<u64, oneshot::Sender<Reply>>,
}

fn lock(pending: &StdMutex<Pending>) -> MutexGuard<'_, Pending> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes a waiter whose request future was dropped before its reply.
struct PendingGuard<'a> {
    pending: &'a StdMutex<Pending>,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        lock(self.pending).waiters.remove(&self.id);
    }
}

/// Client for one provider's stdio session.
pub struct McpClient {
    writer: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
    pending: Arc<StdMutex<Pending>>,
    next_id: AtomicU64,
    init: OnceCell<InitializeResult>,
    reader: JoinHandle<()>,
}

impl McpClient {
    /// Attach to a provider's stdin and stdout.
    ///
    /// Spawns the response reader on the current runtime. No request is
    /// sent until `initialize` or a handshake is performed.
    pub fn attach<W, R>(writer: W, reader: R) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
        R: AsyncRead + Send + Unpin + 'static,
    {
        let pending = Arc::new(StdMutex::new(Pending::default()));
        let reader = tokio::spawn(read_responses(reader, Arc::clone(&pending)));
        Self {
            writer: Mutex::new(Box::new(writer)),
            pending,
            next_id: AtomicU64::new(1),
            init: OnceCell::new(),
            reader,
        }
    }

    /// Initialize the MCP session, once. Later calls return the cached result.
    pub async fn initialize(&self) -> Result<&InitializeResult, McpClientError> {
        self.init
            .get_or_try_init(|| async {
                let params = json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "clientInfo": {
                        "name": "mcpvisor",
                        "version": env!("CARGO_PKG_VERSION")
                    },
                    "capabilities": {}
                });

                let result: InitializeResult = self.request("initialize", Some(params)).await?;
                self.notify("notifications/initialized", None).await?;

                debug!(
                    server = %result.server_info.name,
                    protocol = %result.protocol_version,
                    "MCP session initialized"
                );
                Ok(result)
            })
            .await
    }

    /// Liveness round-trip on an initialized session.
    pub async fn ping(&self) -> Result<(), McpClientError> {
        self.request::<Value>("ping", None).await.map(|_| ())
    }

    /// Names of the tools the provider exposes.
    pub async fn list_tools(&self) -> Result<Vec<String>, McpClientError> {
        let result: ListToolsResult = self.request("tools/list", Some(json!({}))).await?;
        Ok(result.tools.into_iter().map(|t| t.name).collect())
    }

    /// Send a JSON-RPC request and wait for its response.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<T, McpClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = lock(&self.pending);
            if pending.closed {
                return Err(McpClientError::Closed);
            }
            pending.waiters.insert(id, tx);
        }
        let _guard = PendingGuard {
            pending: &self.pending,
            id,
        };

        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };
        self.write_line(serde_json::to_string(&request)?).await?;

        let value = rx.await.map_err(|_| McpClientError::Closed)??;
        serde_json::from_value(value).map_err(Into::into)
    }

    /// Send a JSON-RPC notification (no response expected).
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), McpClientError> {
        let notification = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params.unwrap_or_else(|| json!({}))
        });
        self.write_line(serde_json::to_string(&notification)?).await
    }

    async fn write_line(&self, mut line: String) -> Result<(), McpClientError> {
        line.push('\n');
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}

impl Drop for McpClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[async_trait]
impl ProviderChannel for McpClient {
    async fn handshake(&self) -> Result<HandshakeReport, ProbeFailure> {
        let resumed = self.init.initialized();
        let init = self.initialize().await?;
        if resumed {
            self.ping().await?;
        }

        let tools = if init.capabilities.tools.is_some() {
            self.list_tools().await?
        } else {
            Vec::new()
        };

        Ok(HandshakeReport {
            server_name: Some(init.server_info.name.clone()),
            version: init.server_info.version.clone(),
            protocol_version: Some(init.protocol_version.clone()),
            tools,
        })
    }
}

async fn read_responses<R>(reader: R, pending: Arc<StdMutex<Pending>>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match serde_json::from_str::<JsonRpcMessage>(trimmed) {
                    Ok(message) if message.method.is_none() => dispatch(&pending, message),
                    Ok(message) => {
                        debug!(method = ?message.method, "Ignoring provider-initiated message");
                    }
                    // npx and friends print banners on stdout
                    Err(_) => debug!(line = trimmed, "Skipping non-JSON-RPC output"),
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!(error = %e, "Provider stdout read failed");
                break;
            }
        }
    }

    let waiters = {
        let mut state = lock(&pending);
        state.closed = true;
        std::mem::take(&mut state.waiters)
    };
    for (_, tx) in waiters {
        let _ = tx.send(Err(McpClientError::Closed));
    }
}

fn dispatch(pending: &StdMutex<Pending>, message: JsonRpcMessage) {
    let Some(id) = message.id.as_ref().and_then(Value::as_u64) else {
        debug!("Ignoring response without numeric id");
        return;
    };
    let Some(tx) = lock(pending).waiters.remove(&id) else {
        debug!(id, "Ignoring response for unknown request");
        return;
    };

    let reply = match message.error {
        Some(err) => Err(McpClientError::Server {
            code: err.code,
            message: err.message,
        }),
        None => Ok(message.result.unwrap_or(Value::Null)),
    };
    let _ = tx.send(reply);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{DuplexStream, duplex};

    /// Minimal in-memory MCP server answering by method name.
    fn fake_server(with_tools: bool) -> (DuplexStream, DuplexStream) {
        let (client_out, server_in) = duplex(4096);
        let (server_out, client_in) = duplex(4096);

        tokio::spawn(async move {
            let mut lines = BufReader::new(server_in).lines();
            let mut out = server_out;
            out.write_all(b"npx: installing packages\n").await.unwrap();
            while let Ok(Some(line)) = lines.next_line().await {
                let msg: Value = serde_json::from_str(&line).unwrap();
                let Some(id) = msg.get("id").cloned() else {
                    continue;
                };
                let result = match msg["method"].as_str() {
                    Some("initialize") => {
                        let capabilities = if with_tools {
                            json!({"tools": {}})
                        } else {
                            json!({})
                        };
                        json!({
                            "protocolVersion": PROTOCOL_VERSION,
                            "serverInfo": {"name": "fake", "version": "0.9.1"},
                            "capabilities": capabilities
                        })
                    }
                    Some("tools/list") => json!({"tools": [{"name": "read_file"}, {"name": "write_file"}]}),
                    Some("ping") => json!({}),
                    _ => {
                        let reply = json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32601, "message": "Method not found"}});
                        out.write_all(format!("{reply}\n").as_bytes()).await.unwrap();
                        continue;
                    }
                };
                let reply = json!({"jsonrpc": "2.0", "id": id, "result": result});
                out.write_all(format!("{reply}\n").as_bytes()).await.unwrap();
            }
        });

        (client_out, client_in)
    }

    #[test]
    fn test_json_rpc_request_serialization() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "tools/list",
            params: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"method\":\"tools/list\""));
        assert!(!json.contains("params"));
    }

    #[tokio::test]
    async fn test_handshake_lists_tools() {
        let (writer, reader) = fake_server(true);
        let client = McpClient::attach(writer, reader);

        let report = client.handshake().await.unwrap();
        assert_eq!(report.server_name.as_deref(), Some("fake"));
        assert_eq!(report.version.as_deref(), Some("0.9.1"));
        assert_eq!(report.tools, vec!["read_file", "write_file"]);

        // Second handshake reuses the session
        let again = client.handshake().await.unwrap();
        assert_eq!(again.tools.len(), 2);
    }

    #[tokio::test]
    async fn test_handshake_without_tools_capability() {
        let (writer, reader) = fake_server(false);
        let client = McpClient::attach(writer, reader);

        let report = client.handshake().await.unwrap();
        assert!(report.tools.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let (writer, reader) = fake_server(true);
        let client = McpClient::attach(writer, reader);

        let err = client.request::<Value>("resources/list", None).await.unwrap_err();
        assert!(matches!(err, McpClientError::Server { code: -32601, .. }));
    }

    #[tokio::test]
    async fn test_closed_stdout_fails_pending_requests() {
        let (writer, _server_in) = duplex(1024);
        let (server_out, reader) = duplex(1024);
        let client = McpClient::attach(writer, reader);
        drop(server_out);

        let err = client.handshake().await.unwrap_err();
        assert!(matches!(err, ProbeFailure::Exited(_)));
    }
}
