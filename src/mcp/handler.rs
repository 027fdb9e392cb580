//! Dispatch of JSON-RPC requests to MCP methods.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::mcp::protocol::{
    CallToolParams, CallToolResult, INTERNAL_ERROR, INVALID_REQUEST, Implementation,
    InitializeParams, InitializeResult, JSONRPC_VERSION, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, LATEST_PROTOCOL_VERSION, ListToolsResult, SUPPORTED_PROTOCOL_VERSIONS,
    ServerCapabilities, ToolsCapability,
};
use crate::mcp::tools::{SUMMARIZE_TOOL, SummarizeArgs, tool_definitions};
use crate::service::ArticleService;

pub const SERVER_NAME: &str = "wiki-summary-gemini";

#[derive(Clone)]
pub struct McpHandler {
    service: Arc<ArticleService>,
    tool_timeout: Duration,
}

impl McpHandler {
    pub fn new(service: Arc<ArticleService>, tool_timeout: Duration) -> Self {
        Self {
            service,
            tool_timeout,
        }
    }

    /// Handle one message. Notifications produce no response.
    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            debug!(method = %request.method, "Notification received");
            return None;
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(INVALID_REQUEST, "jsonrpc must be \"2.0\""),
            ));
        }

        let outcome = match request.method.as_str() {
            "initialize" => self.initialize(request.params),
            "ping" => Ok(json!({})),
            "tools/list" => to_value(ListToolsResult {
                tools: tool_definitions(),
            }),
            "tools/call" => self.call_tool(request.params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = decode_params(params)?;
        info!(
            client = %params.client_info.name,
            protocol = %params.protocol_version,
            "Client initializing"
        );

        let protocol_version =
            if SUPPORTED_PROTOCOL_VERSIONS.contains(&params.protocol_version.as_str()) {
                params.protocol_version
            } else {
                LATEST_PROTOCOL_VERSION.to_string()
            };

        to_value(InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: false,
                }),
            },
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            },
            instructions: None,
        })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = decode_params(params)?;
        if params.name != SUMMARIZE_TOOL {
            return Err(JsonRpcError::invalid_params(format!(
                "Unknown tool: {}",
                params.name
            )));
        }
        let args = SummarizeArgs::from_arguments(params.arguments)?;

        let start = Instant::now();
        let outcome = tokio::time::timeout(
            self.tool_timeout,
            self.service.summarize_article(&args.url),
        )
        .await
        .unwrap_or_else(|_| {
            Err(AppError::Timeout(format!(
                "Request processing timed out after {:?}",
                self.tool_timeout
            )))
        });

        match outcome {
            Ok(article) => {
                info!(url = %args.url, elapsed = ?start.elapsed(), "Tool call succeeded");
                to_value(CallToolResult::text(article.summary))
            }
            Err(err) => {
                warn!(url = %args.url, error = %err, "Tool call failed");
                Err(JsonRpcError::new(err.code(), err.to_string()))
            }
        }
    }
}

fn decode_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {e}")))
}

fn to_value(result: impl serde::Serialize) -> Result<Value, JsonRpcError> {
    serde_json::to_value(result)
        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))
}
