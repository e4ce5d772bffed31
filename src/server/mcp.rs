//! MCP protocol implementation for JSON-RPC 2.0 communication.
//!
//! Requests arrive one per line and are answered one per line. The loop is
//! generic over its reader and writer; [`McpServer::run`] binds it to stdio.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use super::{handle_tool_call, SharedState};

#[cfg(test)]
#[path = "mcp_tests.rs"]
mod mcp_tests;

/// MCP protocol revision this server speaks.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Invalid JSON was received.
pub const PARSE_ERROR: i32 = -32700;
/// The method does not exist.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameters.
pub const INVALID_PARAMS: i32 = -32602;
/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i32 = -32603;

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request identifier (None for notifications).
    pub id: Option<Value>,
    /// The method name to invoke.
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    /// Request identifier; null when the request could not be parsed.
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// MCP server information returned during initialization.
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// MCP server capabilities advertised to clients.
#[derive(Debug, Serialize)]
pub struct Capabilities {
    pub tools: ToolCapabilities,
}

/// Tool-specific capabilities.
#[derive(Debug, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change dynamically.
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Result of the MCP initialize handshake.
#[derive(Debug, Serialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: Capabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// MCP tool definition with JSON Schema.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    /// Unique tool name (used in tool calls).
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Parameters for a tools/call request.
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Content item within a tool result.
#[derive(Debug, Serialize)]
pub struct ToolResultContent {
    /// The content type (always "text" here).
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

/// Result of a tool invocation.
#[derive(Debug, Serialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolResultContent>,
    /// Set when the tool failed; the text then carries the error message.
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

impl ToolCallResult {
    fn text(text: String) -> Self {
        Self {
            content: vec![ToolResultContent {
                content_type: "text".to_string(),
                text,
            }],
            is_error: None,
        }
    }

    fn failure(message: String) -> Self {
        Self {
            content: vec![ToolResultContent {
                content_type: "text".to_string(),
                text: format!("Error: {}", message),
            }],
            is_error: Some(true),
        }
    }
}

/// MCP server speaking newline-delimited JSON-RPC.
pub struct McpServer {
    state: SharedState,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Run the server on stdin/stdout until EOF
    pub async fn run(&self) -> std::io::Result<()> {
        info!("Sales DM assistant server starting...");
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.serve(reader, writer).await
    }

    /// Serve requests from `reader`, writing responses to `writer`, until EOF.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                info!("EOF received, shutting down");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            debug!(request = %trimmed, "Received request");

            let response = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => {
                    error!(error = %e, "Failed to parse request");
                    Some(JsonRpcResponse::error(
                        None,
                        PARSE_ERROR,
                        format!("Parse error: {}", e),
                    ))
                }
            };

            // notifications get no reply
            if let Some(response) = response {
                let response_json = serde_json::to_string(&response)?;
                debug!(response = %response_json, "Sending response");

                writer.write_all(response_json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle a single JSON-RPC request.
    ///
    /// Returns None for notifications (requests without id).
    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let is_notification = request.id.is_none();

        match request.method.as_str() {
            "initialize" => Some(self.handle_initialize(request.id)),
            "initialized" | "notifications/initialized" | "notifications/cancelled" => {
                debug!(method = %request.method, "Received notification");
                None
            }
            "tools/list" => Some(self.handle_tools_list(request.id)),
            "tools/call" => Some(self.handle_tool_call(request.id, request.params).await),
            "ping" => Some(JsonRpcResponse::success(
                request.id,
                Value::Object(Default::default()),
            )),
            method => {
                if is_notification {
                    debug!(method = %method, "Unknown notification, ignoring");
                    None
                } else {
                    error!(method = %method, "Unknown method");
                    Some(JsonRpcResponse::error(
                        request.id,
                        METHOD_NOT_FOUND,
                        format!("Method not found: {}", method),
                    ))
                }
            }
        }
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Handling initialize request");

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: Capabilities {
                tools: ToolCapabilities {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        match serde_json::to_value(result) {
            Ok(val) => JsonRpcResponse::success(id, val),
            Err(e) => {
                error!(error = %e, "Failed to serialize initialize result");
                JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Internal error: {}", e))
            }
        }
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Handling tools/list request");
        JsonRpcResponse::success(id, serde_json::json!({ "tools": list_tools() }))
    }

    async fn handle_tool_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        INVALID_PARAMS,
                        format!("Invalid params: {}", e),
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing params");
            }
        };

        info!(tool = %params.name, "Handling tool call");

        let tool_result =
            match handle_tool_call(&self.state, &params.name, params.arguments).await {
                Ok(result) => match serde_json::to_string_pretty(&result) {
                    Ok(text) => ToolCallResult::text(text),
                    Err(e) => {
                        error!(error = %e, "Failed to serialize tool result");
                        ToolCallResult::failure(format!("Serialization failed: {}", e))
                    }
                },
                Err(e) => {
                    error!(tool = %params.name, error = %e, "Tool call failed");
                    ToolCallResult::failure(e.to_string())
                }
            };

        match serde_json::to_value(tool_result) {
            Ok(val) => JsonRpcResponse::success(id, val),
            Err(e) => {
                error!(error = %e, "Failed to serialize tool call result");
                JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Internal error: {}", e))
            }
        }
    }
}

/// Every tool this server exposes, in listing order.
pub fn list_tools() -> Vec<Tool> {
    vec![
        get_analyze_message_tool(),
        get_list_clients_tool(),
        get_list_interactions_tool(),
        get_analytics_tool(),
        get_set_stage_tool(),
        get_classify_tool(),
        get_score_tool(),
        get_assess_risk_tool(),
        get_strategies_tool(),
    ]
}

const PERSONALITIES: [&str; 5] = [
    "curious",
    "hesitant",
    "quick-tempered",
    "skeptical",
    "highly-engaged",
];

const STAGES: [&str; 5] = ["awareness", "interest", "consideration", "intent", "purchase"];

fn get_analyze_message_tool() -> Tool {
    Tool {
        name: "sales_analyze_message".to_string(),
        description: "Analyze an inbound Instagram comment or DM: classify the sender's personality, generate a reply, record the exchange and check outreach volume.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "username": {
                    "type": "string",
                    "description": "Sender's Instagram username"
                },
                "message": {
                    "type": "string",
                    "description": "The inbound message text"
                },
                "interaction_type": {
                    "type": "string",
                    "enum": ["comment", "dm", "story-reply"],
                    "description": "Channel the message arrived on (default: dm)"
                }
            },
            "required": ["username", "message"],
            "additionalProperties": false
        }),
    }
}

fn get_list_clients_tool() -> Tool {
    Tool {
        name: "sales_list_clients".to_string(),
        description: "List all known clients, most recently active first.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
    }
}

fn get_list_interactions_tool() -> Tool {
    Tool {
        name: "sales_list_interactions".to_string(),
        description: "List recorded interactions, newest first. Optionally filter by client."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "client_id": {
                    "type": "string",
                    "description": "Only return this client's interactions"
                }
            },
            "additionalProperties": false
        }),
    }
}

fn get_analytics_tool() -> Tool {
    Tool {
        name: "sales_analytics".to_string(),
        description: "Dashboard aggregates: client counts, link and conversion rates, today's volume and revenue.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
    }
}

fn get_set_stage_tool() -> Tool {
    Tool {
        name: "sales_set_stage".to_string(),
        description: "Move a client to another funnel stage and recompute their conversion probability.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "client_id": {
                    "type": "string",
                    "description": "The client to update"
                },
                "stage": {
                    "type": "string",
                    "enum": STAGES,
                    "description": "New funnel stage"
                }
            },
            "required": ["client_id", "stage"],
            "additionalProperties": false
        }),
    }
}

fn get_classify_tool() -> Tool {
    Tool {
        name: "sales_classify".to_string(),
        description: "Classify a message into a personality category without recording anything."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "Message text to classify"
                },
                "prior_interactions": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "How many earlier messages the sender has sent (default: 0)"
                }
            },
            "required": ["message"],
            "additionalProperties": false
        }),
    }
}

fn get_score_tool() -> Tool {
    Tool {
        name: "sales_score".to_string(),
        description: "Compute a conversion probability for a personality, funnel stage and engagement counters.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "personality": {
                    "type": "string",
                    "enum": PERSONALITIES
                },
                "stage": {
                    "type": "string",
                    "description": "Funnel stage label; unrecognized labels get a neutral weight"
                },
                "total_interactions": {
                    "type": "integer",
                    "minimum": 0
                },
                "link_clicks": {
                    "type": "integer",
                    "minimum": 0
                }
            },
            "required": ["personality", "stage"],
            "additionalProperties": false
        }),
    }
}

fn get_assess_risk_tool() -> Tool {
    Tool {
        name: "sales_assess_risk".to_string(),
        description: "Check an outreach count against the hourly (30) and daily (200) spam limits."
            .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "count": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Replies sent within the window"
                },
                "window_hours": {
                    "type": "integer",
                    "enum": [1, 24],
                    "description": "Window length in hours"
                }
            },
            "required": ["count", "window_hours"],
            "additionalProperties": false
        }),
    }
}

fn get_strategies_tool() -> Tool {
    Tool {
        name: "sales_strategies".to_string(),
        description: "Show the response strategy for one personality, or all of them.".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "personality": {
                    "type": "string",
                    "enum": PERSONALITIES
                }
            },
            "additionalProperties": false
        }),
    }
}
