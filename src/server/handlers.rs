use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::SharedState;
use crate::engine::{
    all_strategies, assess_risk, classify, score_for_stage_label, strategy_for, Personality,
    Strategy,
};
use crate::error::{McpError, McpResult};
use crate::service::{AnalyzeParams, SetStageParams};

/// Route tool calls to appropriate handlers
pub async fn handle_tool_call(
    state: &SharedState,
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<Value> {
    info!(tool = %tool_name, "Routing tool call");

    match tool_name {
        // Conversation tools
        "sales_analyze_message" => handle_analyze_message(state, arguments).await,
        "sales_list_clients" => handle_list_clients(state).await,
        "sales_list_interactions" => handle_list_interactions(state, arguments).await,
        "sales_analytics" => handle_analytics(state).await,
        "sales_set_stage" => handle_set_stage(state, arguments).await,
        // Stateless rule engine tools
        "sales_classify" => handle_classify(arguments),
        "sales_score" => handle_score(arguments),
        "sales_assess_risk" => handle_assess_risk(arguments),
        "sales_strategies" => handle_strategies(arguments),
        _ => Err(McpError::UnknownTool {
            tool_name: tool_name.to_string(),
        }),
    }
}

/// Handle sales_analyze_message tool call
async fn handle_analyze_message(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler(
        "sales_analyze_message",
        arguments,
        |params: AnalyzeParams| state.service.analyze_message(params),
    )
    .await
}

/// Handle sales_list_clients tool call
async fn handle_list_clients(state: &SharedState) -> McpResult<Value> {
    let clients = state.service.list_clients().await?;
    Ok(serde_json::json!({
        "count": clients.len(),
        "clients": clients,
    }))
}

/// Handle sales_list_interactions - all interactions or one client's
async fn handle_list_interactions(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    #[derive(Deserialize, Default)]
    struct ListParams {
        #[serde(default)]
        client_id: Option<String>,
    }

    let params: ListParams = parse_optional_arguments("sales_list_interactions", arguments)?;
    let interactions = state
        .service
        .list_interactions(params.client_id.as_deref())
        .await?;

    Ok(serde_json::json!({
        "count": interactions.len(),
        "interactions": interactions,
    }))
}

/// Handle sales_analytics tool call
async fn handle_analytics(state: &SharedState) -> McpResult<Value> {
    let summary = state.service.analytics().await?;
    serde_json::to_value(summary).map_err(McpError::Json)
}

/// Handle sales_set_stage tool call
async fn handle_set_stage(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    execute_handler("sales_set_stage", arguments, |params: SetStageParams| {
        state.service.set_stage(params)
    })
    .await
}

/// Handle sales_classify - classify a message without recording it
fn handle_classify(arguments: Option<Value>) -> McpResult<Value> {
    #[derive(Deserialize)]
    struct ClassifyParams {
        message: String,
        #[serde(default)]
        prior_interactions: usize,
    }

    #[derive(Serialize)]
    struct ClassifyResult {
        personality: Personality,
        strategy: &'static Strategy,
    }

    let params: ClassifyParams = parse_arguments("sales_classify", arguments)?;
    let personality = classify(&params.message, params.prior_interactions);

    serde_json::to_value(ClassifyResult {
        personality,
        strategy: strategy_for(personality),
    })
    .map_err(McpError::Json)
}

/// Handle sales_score - conversion probability for hypothetical inputs
fn handle_score(arguments: Option<Value>) -> McpResult<Value> {
    #[derive(Deserialize)]
    struct ScoreParams {
        personality: Personality,
        stage: String,
        #[serde(default)]
        total_interactions: u32,
        #[serde(default)]
        link_clicks: u32,
    }

    let params: ScoreParams = parse_arguments("sales_score", arguments)?;
    let probability = score_for_stage_label(
        params.personality,
        &params.stage,
        params.total_interactions,
        params.link_clicks,
    );

    Ok(serde_json::json!({ "conversion_probability": probability }))
}

/// Handle sales_assess_risk - check an outreach count against the volume limits
fn handle_assess_risk(arguments: Option<Value>) -> McpResult<Value> {
    #[derive(Deserialize)]
    struct RiskParams {
        count: usize,
        window_hours: u32,
    }

    let params: RiskParams = parse_arguments("sales_assess_risk", arguments)?;
    serde_json::to_value(assess_risk(params.count, params.window_hours)).map_err(McpError::Json)
}

/// Handle sales_strategies - one strategy or the full table
fn handle_strategies(arguments: Option<Value>) -> McpResult<Value> {
    #[derive(Deserialize, Default)]
    struct StrategyParams {
        #[serde(default)]
        personality: Option<Personality>,
    }

    let params: StrategyParams = parse_optional_arguments("sales_strategies", arguments)?;
    let strategies = match params.personality {
        Some(p) => vec![strategy_for(p)],
        None => all_strategies(),
    };

    Ok(serde_json::json!({ "strategies": strategies }))
}

// ============================================================================
// Helper functions
// ============================================================================

/// Parse required tool arguments into a typed parameter struct.
fn parse_arguments<T: serde::de::DeserializeOwned>(
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<T> {
    match arguments {
        Some(args) => serde_json::from_value(args).map_err(|e| McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: e.to_string(),
        }),
        None => Err(McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: "Missing arguments".to_string(),
        }),
    }
}

/// Parse tool arguments where every field is optional; absent arguments mean defaults.
fn parse_optional_arguments<T: serde::de::DeserializeOwned + Default>(
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<T> {
    match arguments {
        None | Some(Value::Null) => Ok(T::default()),
        args => parse_arguments(tool_name, args),
    }
}

/// Generic handler that executes a service operation with consistent error handling.
///
/// Parses typed arguments, maps the operation's error into
/// [`McpError::ExecutionFailed`] and serializes the result.
async fn execute_handler<P, R, E, F, Fut>(
    tool_name: &str,
    arguments: Option<Value>,
    operation: F,
) -> McpResult<Value>
where
    P: serde::de::DeserializeOwned,
    R: Serialize,
    E: std::fmt::Display,
    F: FnOnce(P) -> Fut,
    Fut: std::future::Future<Output = Result<R, E>>,
{
    let params: P = parse_arguments(tool_name, arguments)?;

    let result = operation(params)
        .await
        .map_err(|e| McpError::ExecutionFailed {
            message: e.to_string(),
        })?;

    serde_json::to_value(result).map_err(McpError::Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::AppState;
    use crate::storage::MemoryStorage;
    use serde_json::json;
    use std::sync::Arc;

    fn state() -> SharedState {
        Arc::new(AppState::new(
            Config::default(),
            Arc::new(MemoryStorage::new()),
        ))
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = handle_tool_call(&state(), "sales_nope", None)
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::UnknownTool { .. }));
    }

    #[tokio::test]
    async fn test_analyze_requires_arguments() {
        let err = handle_tool_call(&state(), "sales_analyze_message", None)
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::InvalidParameters { .. }));
    }

    #[tokio::test]
    async fn test_analyze_missing_message_is_execution_failure() {
        let err = handle_tool_call(
            &state(),
            "sales_analyze_message",
            Some(json!({ "username": "@a" })),
        )
        .await
        .unwrap_err();
        match err {
            McpError::ExecutionFailed { message } => assert!(message.contains("message")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_analyze_accepts_client_username_alias() {
        let state = state();
        let value = handle_tool_call(
            &state,
            "sales_analyze_message",
            Some(json!({
                "client_username": "@alias_user",
                "message": "Can you send me the link? I want to check it out!"
            })),
        )
        .await
        .unwrap();

        assert_eq!(value["client"]["username"], "@alias_user");
        assert_eq!(value["risk_assessment"]["safe"], true);
    }

    #[tokio::test]
    async fn test_analyze_accepts_camel_case_fields() {
        let state = state();
        let value = handle_tool_call(
            &state,
            "sales_analyze_message",
            Some(json!({
                "clientUsername": "@camel",
                "message": "hello there, tell me about this thing",
                "interactionType": "comment"
            })),
        )
        .await
        .unwrap();
        assert_eq!(value["client"]["username"], "@camel");

        let listed = handle_tool_call(&state, "sales_list_interactions", None)
            .await
            .unwrap();
        assert_eq!(listed["interactions"][0]["type"], "comment");
    }

    #[tokio::test]
    async fn test_labels_accepted_in_any_case() {
        let state = state();
        let analyzed = handle_tool_call(
            &state,
            "sales_analyze_message",
            Some(json!({
                "username": "@caps",
                "message": "hello there, tell me about this thing",
                "interaction_type": "Story-Reply"
            })),
        )
        .await
        .unwrap();

        let client_id = analyzed["client"]["id"].as_str().unwrap();
        let updated = handle_tool_call(
            &state,
            "sales_set_stage",
            Some(json!({ "client_id": client_id, "stage": "Intent" })),
        )
        .await
        .unwrap();
        assert_eq!(updated["stage"], "intent");

        let scored = handle_score(Some(json!({
            "personality": "Highly-Engaged",
            "stage": "Purchase"
        })))
        .unwrap();
        let lower = handle_score(Some(json!({
            "personality": "highly-engaged",
            "stage": "purchase"
        })))
        .unwrap();
        assert_eq!(scored, lower);

        let listed = handle_tool_call(&state, "sales_list_interactions", None)
            .await
            .unwrap();
        assert_eq!(listed["interactions"][0]["type"], "story-reply");
    }

    #[tokio::test]
    async fn test_list_tools_accept_missing_arguments() {
        let state = state();
        let clients = handle_tool_call(&state, "sales_list_clients", None)
            .await
            .unwrap();
        assert_eq!(clients["count"], 0);

        let interactions = handle_tool_call(&state, "sales_list_interactions", None)
            .await
            .unwrap();
        assert_eq!(interactions["count"], 0);
    }

    #[test]
    fn test_classify_tool() {
        let value = handle_classify(Some(json!({
            "message": "This sounds like a scam and I'm not sure about it"
        })))
        .unwrap();
        assert_eq!(value["personality"], "skeptical");
        assert_eq!(value["strategy"]["tone"], "Honest, detailed, fact-based");
    }

    #[test]
    fn test_score_tool_unknown_stage() {
        let known = handle_score(Some(json!({
            "personality": "curious",
            "stage": "awareness"
        })))
        .unwrap();
        let unknown = handle_score(Some(json!({
            "personality": "curious",
            "stage": "nonsense"
        })))
        .unwrap();
        assert!(
            unknown["conversion_probability"].as_f64().unwrap()
                > known["conversion_probability"].as_f64().unwrap()
        );
    }

    #[test]
    fn test_assess_risk_tool() {
        let value = handle_assess_risk(Some(json!({ "count": 201, "window_hours": 24 }))).unwrap();
        assert_eq!(value["safe"], false);

        let value = handle_assess_risk(Some(json!({ "count": 200, "window_hours": 24 }))).unwrap();
        assert_eq!(value["safe"], true);
        assert!(value.get("message").is_none());
    }

    #[test]
    fn test_strategies_tool() {
        let all = handle_strategies(None).unwrap();
        assert_eq!(all["strategies"].as_array().unwrap().len(), 5);

        let one = handle_strategies(Some(json!({ "personality": "quick-tempered" }))).unwrap();
        let list = one["strategies"].as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["personality"], "quick-tempered");
    }
}
