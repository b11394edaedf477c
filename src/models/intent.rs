use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AppError, Result};

// ==================== TRANSACTION KIND ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Transfer,
    Swap,
    ContractCall,
    Custom,
}

impl TransactionKind {
    /// Maps a free-form `type` label onto a kind. Unknown labels become `Custom`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "transfer" | "send" => TransactionKind::Transfer,
            "swap" => TransactionKind::Swap,
            "contract_call" | "contract-call" | "call" => TransactionKind::ContractCall,
            _ => TransactionKind::Custom,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Transfer => "transfer",
            TransactionKind::Swap => "swap",
            TransactionKind::ContractCall => "contract_call",
            TransactionKind::Custom => "custom",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== SWAP PAIR ====================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapPair {
    pub sell: String,
    pub buy: String,
}

// ==================== TRANSACTION INTENT ====================
/// Structured transaction recovered from agent text, handed to the wallet boundary.
///
/// `recipient` is always `0x` followed by 40 hex digits; intents without a usable
/// recipient are never constructed by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionIntent {
    pub kind: TransactionKind,
    pub recipient: String,
    /// Decimal quantity in wei.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// Hex call data, only for `contract_call`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap: Option<SwapPair>,
}

impl TransactionIntent {
    pub fn default_description(kind: TransactionKind, recipient: &str) -> String {
        match kind {
            TransactionKind::Custom => format!("Transaction to {}", recipient),
            other => format!("{} transaction to {}", capitalize(other.as_str()), recipient),
        }
    }

    /// Checks an intent that arrived from outside the extractor (e.g. an HTTP body).
    pub fn validate(&self) -> Result<()> {
        if !is_evm_address(&self.recipient) {
            return Err(AppError::InvalidAddress(self.recipient.clone()));
        }
        if let Some(amount) = &self.amount {
            if amount.is_empty() || !amount.chars().all(|c| c.is_ascii_digit()) {
                return Err(AppError::BadRequest(format!(
                    "amount must be a decimal wei quantity, got '{}'",
                    amount
                )));
            }
        }
        if let Some(payload) = &self.payload {
            if self.kind != TransactionKind::ContractCall {
                return Err(AppError::BadRequest(
                    "payload is only allowed for contract_call intents".to_string(),
                ));
            }
            if !is_hex_payload(payload) {
                return Err(AppError::BadRequest(
                    "payload must be 0x-prefixed hex".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// Internal helper that checks conditions for `is_evm_address`.
pub fn is_evm_address(value: &str) -> bool {
    value.len() == 42
        && value.starts_with("0x")
        && value[2..].chars().all(|c| c.is_ascii_hexdigit())
}

fn is_hex_payload(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .map(|body| body.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
