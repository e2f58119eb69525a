//! MCP (Model Context Protocol) client for the text-understanding service.
//!
//! Implements JSON-RPC 2.0 over the stdio of a spawned server process.

use crate::error::{McpError, McpResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// JSON-RPC 2.0 version string
const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol version
const MCP_PROTOCOL_VERSION: &str = "2025-11-25";

/// Client name and version
const CLIENT_NAME: &str = "deploy-character";
const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// JSON-RPC Request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<u64>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Create a new request with an ID (expects response)
    pub fn new(id: u64, method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            method: method.to_string(),
            params,
        }
    }

    /// Create a notification (no response expected)
    pub fn notification(method: &str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: None,
            method: method.to_string(),
            params,
        }
    }
}

/// JSON-RPC Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Get the result or error
    pub fn into_result(self) -> McpResult<Value> {
        if let Some(error) = self.error {
            Err(McpError::RpcError {
                code: error.code,
                message: error.message,
            })
        } else {
            Ok(self.result.unwrap_or(Value::Null))
        }
    }
}

/// JSON-RPC Error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Tool call result content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResultContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: Option<String>,
}

/// Tool call result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ToolResultContent>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl ToolResult {
    /// All text parts joined by newlines
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Initialize request params
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: Value,
    #[serde(rename = "clientInfo")]
    pub client_info: ClientInfo,
}

/// Client info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

/// Initialize result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Value,
    #[serde(rename = "serverInfo")]
    pub server_info: Option<ServerInfo>,
}

/// Server info
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: Option<String>,
}

/// MCP client driving one server process
pub struct McpClient {
    process: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<Lines<BufReader<ChildStdout>>>,
    next_id: u64,
    initialized: bool,
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl McpClient {
    pub fn new(command: String, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            process: None,
            stdin: None,
            stdout: None,
            next_id: 1,
            initialized: false,
            command,
            args,
            timeout,
        }
    }

    fn next_request_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Spawn the server process. A no-op when already connected.
    pub fn connect(&mut self) -> McpResult<()> {
        if self.process.is_some() {
            return Ok(());
        }

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| McpError::SpawnFailed(format!("{}: {}", self.command, e)))?;

        self.stdin = child.stdin.take();
        self.stdout = child.stdout.take().map(|out| BufReader::new(out).lines());
        self.process = Some(child);

        tracing::debug!(command = %self.command, "Spawned MCP server");
        Ok(())
    }

    async fn write_message(&mut self, request: &JsonRpcRequest) -> McpResult<()> {
        let stdin = self.stdin.as_mut().ok_or(McpError::NotConnected)?;
        let mut msg = serde_json::to_string(request)?;
        msg.push('\n');

        stdin
            .write_all(msg.as_bytes())
            .await
            .map_err(|e| McpError::IoError(e.to_string()))?;
        stdin
            .flush()
            .await
            .map_err(|e| McpError::IoError(e.to_string()))
    }

    /// Read lines until the response for `id` arrives.
    ///
    /// Server notifications and non-JSON log lines are skipped.
    async fn read_response(&mut self, id: u64) -> McpResult<JsonRpcResponse> {
        let stdout = self.stdout.as_mut().ok_or(McpError::NotConnected)?;

        loop {
            let line = stdout
                .next_line()
                .await
                .map_err(|e| McpError::IoError(e.to_string()))?
                .ok_or(McpError::Closed)?;

            match serde_json::from_str::<JsonRpcResponse>(&line) {
                Ok(response) if response.id == Some(id) => return Ok(response),
                Ok(_) => tracing::trace!("Skipping unrelated MCP message"),
                Err(_) => tracing::trace!(line = %line, "Skipping non JSON-RPC output"),
            }
        }
    }

    async fn exchange(&mut self, request: &JsonRpcRequest, id: u64) -> McpResult<JsonRpcResponse> {
        self.write_message(request).await?;
        self.read_response(id).await
    }

    /// Send a request and wait (bounded by the client timeout) for its response
    async fn request(&mut self, method: &str, params: Option<Value>) -> McpResult<Value> {
        let id = self.next_request_id();
        let request = JsonRpcRequest::new(id, method, params);
        let timeout = self.timeout;

        let response = tokio::time::timeout(timeout, self.exchange(&request, id))
            .await
            .map_err(|_| McpError::Timeout)??;
        response.into_result()
    }

    /// Send a notification (no response expected)
    async fn notify(&mut self, method: &str, params: Option<Value>) -> McpResult<()> {
        let request = JsonRpcRequest::notification(method, params);
        self.write_message(&request).await
    }

    /// Initialize the MCP connection
    pub async fn initialize(&mut self) -> McpResult<InitializeResult> {
        let params = InitializeParams {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: serde_json::json!({}),
            client_info: ClientInfo {
                name: CLIENT_NAME.to_string(),
                version: CLIENT_VERSION.to_string(),
            },
        };

        let value = self
            .request("initialize", Some(serde_json::to_value(params)?))
            .await?;
        let result: InitializeResult = serde_json::from_value(value)?;

        self.notify("notifications/initialized", None).await?;

        self.initialized = true;
        tracing::debug!(
            server = result.server_info.as_ref().map(|s| s.name.as_str()).unwrap_or("unknown"),
            "MCP session initialized"
        );
        Ok(result)
    }

    /// Call a tool
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> McpResult<ToolResult> {
        if !self.initialized {
            return Err(McpError::NotInitialized);
        }

        let params = serde_json::json!({
            "name": name,
            "arguments": arguments
        });

        let value = self.request("tools/call", Some(params)).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Kill the server process and reset the session
    pub async fn close(&mut self) {
        if let Some(mut process) = self.process.take() {
            let _ = process.kill().await;
        }
        self.stdin = None;
        self.stdout = None;
        self.next_id = 1;
        self.initialized = false;
    }

    pub fn is_connected(&self) -> bool {
        self.process.is_some()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}
