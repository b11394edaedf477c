use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::{
    error::Result,
    models::{ApiResponse, TransactionIntent},
    services::{chat::ChatOutcome, intent_extractor::Strategy, shortcuts::ShortcutDescription},
    utils::cap_user_input,
};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub execute: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub input: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub instruction: String,
    pub expanded: bool,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub intent: Option<TransactionIntent>,
    pub matched_by: Option<Strategy>,
}

/// POST /api/v1/agent/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatOutcome>>> {
    tracing::info!(
        "Agent chat: chars={}, execute={}",
        req.message.chars().count(),
        req.execute
    );
    let outcome = state.chat_service().process(&req.message, req.execute).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// POST /api/v1/agent/resolve
pub async fn resolve_shortcut(
    State(state): State<AppState>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ApiResponse<ResolveResponse>>> {
    let input = cap_user_input(&req.input, state.config.max_input_chars)?;
    let instruction = state.shortcuts.resolve(&input);
    let expanded = instruction != input;
    Ok(Json(ApiResponse::success(ResolveResponse {
        instruction,
        expanded,
    })))
}

/// POST /api/v1/agent/extract
pub async fn extract_intent(
    State(state): State<AppState>,
    Json(req): Json<ExtractRequest>,
) -> Json<ApiResponse<ExtractResponse>> {
    let response = match state.extractor.extract_detailed(&req.text) {
        Some(found) => ExtractResponse {
            intent: Some(found.intent),
            matched_by: Some(found.strategy),
        },
        None => ExtractResponse {
            intent: None,
            matched_by: None,
        },
    };
    Json(ApiResponse::success(response))
}

/// GET /api/v1/agent/shortcuts
pub async fn list_shortcuts(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<ShortcutDescription>>> {
    Json(ApiResponse::success(state.shortcuts.describe_all()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_state;
    use crate::error::AppError;
    use crate::services::chat::tests::{ScriptedAgent, ADDR};
    use crate::services::AgentBackend;
    use std::sync::Arc;

    #[tokio::test]
    async fn resolve_reports_expansion() {
        // Memastikan endpoint resolve menandai alias yang diperluas
        let state = test_state(None, None);
        let Json(body) = resolve_shortcut(
            State(state.clone()),
            Json(ResolveRequest {
                input: "net".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(body.data.expanded);
        assert_eq!(body.data.instruction, "Which network is my wallet connected to?");

        let Json(body) = resolve_shortcut(
            State(state),
            Json(ResolveRequest {
                input: "good morning".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(!body.data.expanded);
        assert_eq!(body.data.instruction, "good morning");
    }

    #[tokio::test]
    async fn extract_returns_strategy() {
        let Json(body) = extract_intent(
            State(test_state(None, None)),
            Json(ExtractRequest {
                text: format!("call contract {} with data 0xabc123", ADDR),
            }),
        )
        .await;
        assert_eq!(body.data.matched_by, Some(Strategy::ContractCallPhrase));
        assert_eq!(
            body.data.intent.unwrap().payload.as_deref(),
            Some("0xabc123")
        );
    }

    #[tokio::test]
    async fn extract_returns_nothing_for_prose() {
        let Json(body) = extract_intent(
            State(test_state(None, None)),
            Json(ExtractRequest {
                text: "hello there".to_string(),
            }),
        )
        .await;
        assert!(body.data.intent.is_none());
        assert!(body.data.matched_by.is_none());
    }

    #[tokio::test]
    async fn shortcuts_listing_matches_table() {
        let state = test_state(None, None);
        let Json(body) = list_shortcuts(State(state.clone())).await;
        assert_eq!(body.data.len(), state.shortcuts.rules().len());
    }

    #[tokio::test]
    async fn chat_runs_full_pipeline() {
        let agent = Arc::new(ScriptedAgent::new(&format!("send 0.1 eth to {}", ADDR)));
        let state = test_state(Some(agent as Arc<dyn AgentBackend>), None);
        let Json(body) = chat(
            State(state),
            Json(ChatRequest {
                message: "tx".to_string(),
                execute: false,
            }),
        )
        .await
        .unwrap();
        assert_eq!(body.data.instruction, "Send");
        assert_eq!(
            body.data.intent.unwrap().amount.as_deref(),
            Some("100000000000000000")
        );
    }

    #[tokio::test]
    async fn chat_without_agent_fails() {
        let result = chat(
            State(test_state(None, None)),
            Json(ChatRequest {
                message: "bal".to_string(),
                execute: false,
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::AgentNotConfigured)));
    }
}
