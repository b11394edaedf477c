use axum::{extract::State, Json};
use serde::Serialize;
use std::time::Duration;

use super::AppState;
use crate::{
    error::{AppError, Result},
    models::{ApiResponse, TransactionIntent},
};

const WALLET_BALANCE_TIMEOUT_SECS: u64 = 6;

#[derive(Debug, Serialize)]
pub struct WalletInfoResponse {
    pub address: String,
    pub network: String,
    pub balance_wei: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExecuteIntentResponse {
    pub tx_hash: String,
    pub description: String,
}

/// GET /api/v1/wallet
pub async fn get_wallet(State(state): State<AppState>) -> Result<Json<ApiResponse<WalletInfoResponse>>> {
    let wallet = state.wallet.as_ref().ok_or(AppError::WalletNotConfigured)?;

    let balance_wei = match tokio::time::timeout(
        Duration::from_secs(WALLET_BALANCE_TIMEOUT_SECS),
        wallet.balance_wei(),
    )
    .await
    {
        Ok(Ok(balance)) => Some(balance),
        Ok(Err(err)) => {
            tracing::warn!("Wallet balance lookup failed: {}", err);
            None
        }
        Err(_) => {
            tracing::warn!(
                "Wallet balance lookup timed out after {}s",
                WALLET_BALANCE_TIMEOUT_SECS
            );
            None
        }
    };

    Ok(Json(ApiResponse::success(WalletInfoResponse {
        address: wallet.address(),
        network: wallet.network(),
        balance_wei,
    })))
}

/// POST /api/v1/wallet/execute
pub async fn execute_intent(
    State(state): State<AppState>,
    Json(intent): Json<TransactionIntent>,
) -> Result<Json<ApiResponse<ExecuteIntentResponse>>> {
    intent.validate()?;
    let wallet = state.wallet.as_ref().ok_or(AppError::WalletNotConfigured)?;
    tracing::info!(
        "Wallet execute: kind={} to={} network={}",
        intent.kind,
        intent.recipient,
        wallet.network()
    );
    let tx_hash = wallet.execute(&intent).await?;
    Ok(Json(ApiResponse::success(ExecuteIntentResponse {
        tx_hash,
        description: intent.description,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_state;
    use crate::models::TransactionKind;
    use crate::services::chat::tests::{StubWallet, ADDR};
    use std::sync::Arc;

    fn transfer() -> TransactionIntent {
        TransactionIntent {
            kind: TransactionKind::Transfer,
            recipient: ADDR.to_string(),
            amount: Some("1".to_string()),
            payload: None,
            description: "one wei".to_string(),
            swap: None,
        }
    }

    #[tokio::test]
    async fn get_wallet_requires_configuration() {
        // Memastikan endpoint wallet menolak jika wallet belum dikonfigurasi
        let result = get_wallet(State(test_state(None, None))).await;
        assert!(matches!(result, Err(AppError::WalletNotConfigured)));
    }

    #[tokio::test]
    async fn get_wallet_reports_address_and_balance() {
        let state = test_state(None, Some(Arc::new(StubWallet)));
        let Json(body) = get_wallet(State(state)).await.unwrap();
        assert_eq!(body.data.network, "stubnet");
        assert_eq!(body.data.balance_wei.as_deref(), Some("1000"));
    }

    #[tokio::test]
    async fn execute_returns_hash() {
        let state = test_state(None, Some(Arc::new(StubWallet)));
        let Json(body) = execute_intent(State(state), Json(transfer())).await.unwrap();
        assert_eq!(body.data.tx_hash, "0xfeed");
        assert_eq!(body.data.description, "one wei");
    }

    #[tokio::test]
    async fn execute_rejects_invalid_recipient_before_wallet_lookup() {
        let mut intent = transfer();
        intent.recipient = "0x".to_string();
        let result = execute_intent(State(test_state(None, None)), Json(intent)).await;
        assert!(matches!(result, Err(AppError::InvalidAddress(_))));
    }
}
