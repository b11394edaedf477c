use axum::{extract::State, Json};
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub environment: String,
    pub testnet: bool,
    pub agent: String,
    pub wallet: String,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let agent_status = if state.agent.is_configured().await {
        "configured".to_string()
    } else {
        "missing".to_string()
    };

    let wallet_status = if state.wallet.is_some() {
        "configured".to_string()
    } else {
        "missing".to_string()
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: state.config.environment.clone(),
        testnet: state.config.is_testnet(),
        agent: agent_status,
        wallet: wallet_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_state;

    #[tokio::test]
    async fn health_reports_missing_components() {
        // Memastikan status agent dan wallet dilaporkan
        let Json(body) = health_check(State(test_state(None, None))).await;
        assert_eq!(body.status, "ok");
        assert_eq!(body.agent, "missing");
        assert_eq!(body.wallet, "missing");
        assert!(body.testnet);
    }
}
