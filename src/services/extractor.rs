//! Character extraction backed by an MCP text-understanding tool.

use super::Extractor;
use super::mcp::{McpClient, ToolResult};
use crate::config::ExtractorConfig;
use crate::domain::CharacterSpec;
use crate::error::{ExtractionError, McpError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;

/// [`Extractor`] that asks an MCP tool for `{name, description}`.
///
/// The server process is started lazily on first use and reused for
/// later requests; calls are serialised over the single stdio session.
pub struct McpExtractor {
    client: Mutex<McpClient>,
    tool: String,
}

impl McpExtractor {
    pub fn new(config: &ExtractorConfig) -> Self {
        let client = McpClient::new(
            config.command.clone(),
            config.args.clone(),
            Duration::from_secs(config.timeout_seconds),
        );
        Self::with_client(client, config.tool.clone())
    }

    pub fn with_client(client: McpClient, tool: String) -> Self {
        Self {
            client: Mutex::new(client),
            tool,
        }
    }
}

#[async_trait]
impl Extractor for McpExtractor {
    async fn extract(&self, text: &str) -> Result<CharacterSpec, ExtractionError> {
        let mut client = self.client.lock().await;

        if !client.is_initialized() {
            client.connect()?;
            if let Err(e) = client.initialize().await {
                client.close().await;
                return Err(e.into());
            }
        }

        let result = match client
            .call_tool(&self.tool, serde_json::json!({ "text": text }))
            .await
        {
            Ok(result) => result,
            // An RPC error means the server answered and the session is intact
            Err(e @ McpError::RpcError { .. }) => return Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "MCP session lost, restarting on next request");
                client.close().await;
                return Err(e.into());
            }
        };
        parse_tool_result(&result)
    }
}

/// Decode the tool's text content as a [`CharacterSpec`]
pub fn parse_tool_result(result: &ToolResult) -> Result<CharacterSpec, ExtractionError> {
    let text = result.text();

    if result.is_error {
        return Err(ExtractionError::Unparseable(text));
    }

    let spec: CharacterSpec = serde_json::from_str(text.trim())
        .map_err(|e| ExtractionError::Unparseable(format!("{}: {}", e, text)))?;

    let name = spec.name.trim();
    if name.is_empty() {
        return Err(ExtractionError::Unparseable(
            "empty character name".to_string(),
        ));
    }

    Ok(CharacterSpec::new(name, spec.description.trim()))
}
