use super::AppState;
use crate::{
    error::{AppError, Result},
    models::ApiResponse,
    services::{AgentBackend, OpenAiAgent},
};
use axum::{
    extract::State,
    http::{HeaderMap, HeaderName},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const ADMIN_KEY_HEADER: &str = "x-admin-key";

#[derive(Deserialize)]
pub struct RotateCredentialsRequest {
    pub api_key: String,
    pub fallback_api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RotateCredentialsResponse {
    pub agent: String,
    pub keys_configured: usize,
}

fn require_admin_key(headers: &HeaderMap, state: &AppState) -> Result<()> {
    let expected = state
        .config
        .admin_manual_key
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            AppError::BadRequest(
                "ADMIN_MANUAL_KEY is not configured on backend. Credential rotation is disabled."
                    .to_string(),
            )
        })?;

    let header_name = HeaderName::from_static(ADMIN_KEY_HEADER);
    let provided = headers
        .get(&header_name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            AppError::AuthError(format!(
                "Missing admin key. Send header '{}' to access this endpoint.",
                ADMIN_KEY_HEADER
            ))
        })?;

    if provided != expected {
        return Err(AppError::AuthError("Invalid admin key".to_string()));
    }
    Ok(())
}

/// POST /api/v1/admin/agent/credentials
pub async fn rotate_agent_credentials(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RotateCredentialsRequest>,
) -> Result<Json<ApiResponse<RotateCredentialsResponse>>> {
    require_admin_key(&headers, &state)?;

    let keys: Vec<String> = std::iter::once(req.api_key)
        .chain(req.fallback_api_key)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .collect();
    if keys.is_empty() {
        return Err(AppError::BadRequest("api_key must not be empty".to_string()));
    }
    let keys_configured = keys.len();

    let wallet_context = state.wallet_context();
    let agent = OpenAiAgent::new(
        state.config.openai_base_url.clone(),
        state.config.openai_model.clone(),
        keys,
        wallet_context.as_ref(),
    )?;
    let label = agent.label();
    state.agent.replace(Arc::new(agent)).await;

    Ok(Json(ApiResponse::success(RotateCredentialsResponse {
        agent: label,
        keys_configured,
    })))
}
