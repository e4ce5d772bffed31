//! Unit tests for MCP protocol implementation.
//!
//! Tests JSON-RPC 2.0 request/response handling, tool definitions,
//! and the request loop over in-memory buffers.

use super::*;
use crate::config::Config;
use crate::server::AppState;
use crate::storage::MemoryStorage;
use serde_json::json;
use std::sync::Arc;

fn create_test_server() -> McpServer {
    let state = AppState::new(Config::default(), Arc::new(MemoryStorage::new()));
    McpServer::new(Arc::new(state))
}

/// Feed newline-delimited requests through the server and collect the replies.
async fn roundtrip(server: &McpServer, input: &str) -> Vec<Value> {
    let mut output = Vec::new();
    server.serve(input.as_bytes(), &mut output).await.unwrap();
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

// ============================================================================
// JsonRpcResponse tests
// ============================================================================

#[test]
fn test_jsonrpc_response_success_with_id() {
    let response = JsonRpcResponse::success(Some(json!(1)), json!({"result": "ok"}));

    assert_eq!(response.jsonrpc, "2.0");
    assert_eq!(response.id, json!(1));
    assert!(response.error.is_none());
    assert_eq!(response.result.unwrap()["result"], "ok");
}

#[test]
fn test_jsonrpc_response_success_without_id() {
    let response = JsonRpcResponse::success(None, json!({"data": "value"}));
    assert_eq!(response.id, Value::Null);
}

#[test]
fn test_jsonrpc_response_error() {
    let response = JsonRpcResponse::error(Some(json!(42)), INVALID_PARAMS, "Missing params");

    assert!(response.result.is_none());
    let error = response.error.unwrap();
    assert_eq!(error.code, -32602);
    assert_eq!(error.message, "Missing params");
}

#[test]
fn test_jsonrpc_response_serialization_omits_empty_side() {
    let ok = serde_json::to_string(&JsonRpcResponse::success(Some(json!(1)), json!({}))).unwrap();
    assert!(ok.contains("\"result\""));
    assert!(!ok.contains("\"error\""));

    let err =
        serde_json::to_string(&JsonRpcResponse::error(Some(json!(1)), METHOD_NOT_FOUND, "x"))
            .unwrap();
    assert!(err.contains("-32601"));
    assert!(!err.contains("\"result\""));
}

// ============================================================================
// Request deserialization tests
// ============================================================================

#[test]
fn test_jsonrpc_request_deserialization() {
    let request: JsonRpcRequest =
        serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .unwrap();

    assert_eq!(request.id, Some(json!(1)));
    assert_eq!(request.method, "initialize");
    assert!(request.params.is_some());
}

#[test]
fn test_jsonrpc_notification_no_id() {
    let request: JsonRpcRequest =
        serde_json::from_str(r#"{"jsonrpc":"2.0","method":"initialized"}"#).unwrap();
    assert!(request.id.is_none());
}

#[test]
fn test_jsonrpc_request_missing_method_field() {
    let result = serde_json::from_str::<JsonRpcRequest>(r#"{"jsonrpc":"2.0","id":1}"#);
    assert!(result.is_err());
}

#[test]
fn test_tool_call_params_without_arguments() {
    let params: ToolCallParams = serde_json::from_str(r#"{"name":"sales_analytics"}"#).unwrap();
    assert_eq!(params.name, "sales_analytics");
    assert!(params.arguments.is_none());
}

// ============================================================================
// Tool definition tests
// ============================================================================

#[test]
fn test_tool_list_names() {
    let names: Vec<String> = list_tools().into_iter().map(|t| t.name).collect();
    assert_eq!(
        names,
        vec![
            "sales_analyze_message",
            "sales_list_clients",
            "sales_list_interactions",
            "sales_analytics",
            "sales_set_stage",
            "sales_classify",
            "sales_score",
            "sales_assess_risk",
            "sales_strategies",
        ]
    );
}

#[test]
fn test_all_tools_have_object_schemas() {
    for tool in list_tools() {
        assert!(!tool.description.is_empty(), "{} has no description", tool.name);
        assert_eq!(tool.input_schema["type"], "object", "{}", tool.name);
        assert!(tool.input_schema["properties"].is_object(), "{}", tool.name);
    }
}

#[test]
fn test_analyze_tool_requires_username_and_message() {
    let tool = get_analyze_message_tool();
    assert_eq!(tool.input_schema["required"], json!(["username", "message"]));
    assert_eq!(
        tool.input_schema["properties"]["interaction_type"]["enum"],
        json!(["comment", "dm", "story-reply"])
    );
}

#[test]
fn test_tool_serializes_input_schema_camel_case() {
    let value = serde_json::to_value(get_set_stage_tool()).unwrap();
    assert!(value.get("inputSchema").is_some());
    assert_eq!(value["inputSchema"]["properties"]["stage"]["enum"][0], "awareness");
}

// ============================================================================
// Request loop tests
// ============================================================================

#[tokio::test]
async fn test_initialize_handshake() {
    let server = create_test_server();
    let replies = roundtrip(
        &server,
        concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
        ),
    )
    .await;

    // the notification gets no reply
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["result"]["protocolVersion"], PROTOCOL_VERSION);
    assert_eq!(replies[0]["result"]["serverInfo"]["name"], "sales-dm-assistant");
}

#[tokio::test]
async fn test_parse_error_and_blank_lines() {
    let server = create_test_server();
    let replies = roundtrip(&server, "\n   \n{not json}\n").await;

    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["error"]["code"], PARSE_ERROR);
    assert_eq!(replies[0]["id"], Value::Null);
}

#[tokio::test]
async fn test_unknown_method() {
    let server = create_test_server();
    let replies = roundtrip(
        &server,
        "{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"resources/list\"}\n",
    )
    .await;

    assert_eq!(replies[0]["id"], 7);
    assert_eq!(replies[0]["error"]["code"], METHOD_NOT_FOUND);
}

#[tokio::test]
async fn test_tools_call_missing_params() {
    let server = create_test_server();
    let replies = roundtrip(
        &server,
        "{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"tools/call\"}\n",
    )
    .await;

    assert_eq!(replies[0]["error"]["code"], INVALID_PARAMS);
}

#[tokio::test]
async fn test_tool_failure_is_error_result() {
    let server = create_test_server();
    let request = json!({
        "jsonrpc": "2.0",
        "id": 4,
        "method": "tools/call",
        "params": { "name": "sales_analyze_message", "arguments": { "username": "  " } }
    });
    let replies = roundtrip(&server, &format!("{}\n", request)).await;

    let result = &replies[0]["result"];
    assert_eq!(result["isError"], true);
    assert!(result["content"][0]["text"]
        .as_str()
        .unwrap()
        .starts_with("Error:"));
}

#[tokio::test]
async fn test_tool_success_returns_pretty_json_text() {
    let server = create_test_server();
    let request = json!({
        "jsonrpc": "2.0",
        "id": 5,
        "method": "tools/call",
        "params": {
            "name": "sales_assess_risk",
            "arguments": { "count": 31, "window_hours": 1 }
        }
    });
    let replies = roundtrip(&server, &format!("{}\n", request)).await;

    let result = &replies[0]["result"];
    assert!(result.get("isError").is_none());
    let text = result["content"][0]["text"].as_str().unwrap();
    let payload: Value = serde_json::from_str(text).unwrap();
    assert_eq!(payload["safe"], false);
}

#[tokio::test]
async fn test_ping() {
    let server = create_test_server();
    let replies = roundtrip(&server, "{\"jsonrpc\":\"2.0\",\"id\":\"p\",\"method\":\"ping\"}\n").await;
    assert_eq!(replies[0]["id"], "p");
    assert_eq!(replies[0]["result"], json!({}));
}
