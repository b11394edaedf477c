//! Recovers a structured transaction from free text returned by the agent.
//!
//! Strategies run in a fixed order and the first one that produces an intent wins.
//! Nothing here fails: ambiguous or malformed text simply yields `None`.

use ethers::types::U256;
use ethers::utils::parse_ether;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::{
    constants::{ETHER_DECIMALS, MAX_EXTRACT_INPUT_BYTES},
    models::{is_evm_address, SwapPair, TransactionIntent, TransactionKind},
    utils::truncate_at_char_boundary,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Structured,
    TransferPhrase,
    SwapPhrase,
    ContractCallPhrase,
    BareAddress,
}

pub const STRATEGY_ORDER: [Strategy; 5] = [
    Strategy::Structured,
    Strategy::TransferPhrase,
    Strategy::SwapPhrase,
    Strategy::ContractCallPhrase,
    Strategy::BareAddress,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub strategy: Strategy,
    pub intent: TransactionIntent,
}

#[derive(Debug, Deserialize)]
struct StructuredPayload {
    to: Option<String>,
    #[serde(default)]
    value: Option<serde_json::Value>,
    #[serde(default)]
    amount: Option<serde_json::Value>,
    #[serde(default)]
    data: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

fn transfer_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bsend\s+(\d+(?:\.\d+)?)\s*(wei|eth)?\s+to\s+(0x[0-9a-f]{40})\b")
            .expect("transfer pattern is valid")
    })
}

fn swap_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i:\bswap)\s+([A-Z]+)\s+(?i:for)\s+([A-Z]+)\b")
            .expect("swap pattern is valid")
    })
}

fn contract_call_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bcall\s+contract\s+(0x[0-9a-f]{40})\s+with\s+data\s+(0x[0-9a-f]+)\b")
            .expect("contract call pattern is valid")
    })
}

fn address_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b0x[0-9a-f]{40}\b").expect("address pattern is valid"))
}

fn fenced_json_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fenced json pattern is valid")
    })
}

/// Transaction intent extractor.
///
/// A swap phrase names tokens but no counterparty, so swap intents are only produced when a
/// swap router address is configured; otherwise the swap strategy declines.
#[derive(Debug, Clone, Default)]
pub struct IntentExtractor {
    swap_router: Option<String>,
}

impl IntentExtractor {
    pub fn new(swap_router: Option<String>) -> Self {
        let swap_router = swap_router
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .and_then(|value| {
                if is_evm_address(&value) {
                    Some(value)
                } else {
                    tracing::warn!("Ignoring malformed swap router address '{}'", value);
                    None
                }
            });
        Self { swap_router }
    }

    pub fn swap_router(&self) -> Option<&str> {
        self.swap_router.as_deref()
    }

    /// Runs the strategies in order and reports the first intent found and the strategy behind it.
    pub fn extract_detailed(&self, text: &str) -> Option<Extraction> {
        if text.len() > MAX_EXTRACT_INPUT_BYTES {
            tracing::warn!(
                "Extraction input of {} bytes truncated to {} bytes",
                text.len(),
                MAX_EXTRACT_INPUT_BYTES
            );
        }
        let text = truncate_at_char_boundary(text, MAX_EXTRACT_INPUT_BYTES);
        STRATEGY_ORDER.iter().find_map(|strategy| {
            self.apply(*strategy, text).map(|intent| {
                tracing::debug!(
                    "Intent extracted by {:?}: kind={} recipient={}",
                    strategy,
                    intent.kind,
                    intent.recipient
                );
                Extraction {
                    strategy: *strategy,
                    intent,
                }
            })
        })
    }

    fn apply(&self, strategy: Strategy, text: &str) -> Option<TransactionIntent> {
        match strategy {
            Strategy::Structured => extract_structured(text),
            Strategy::TransferPhrase => extract_transfer(text),
            Strategy::SwapPhrase => self.extract_swap(text),
            Strategy::ContractCallPhrase => extract_contract_call(text),
            Strategy::BareAddress => extract_bare_address(text),
        }
    }

    fn extract_swap(&self, text: &str) -> Option<TransactionIntent> {
        let caps = swap_regex().captures(text)?;
        let sell = caps.get(1)?.as_str().to_string();
        let buy = caps.get(2)?.as_str().to_string();
        let Some(router) = self.swap_router.as_deref() else {
            tracing::debug!(
                "Swap {} -> {} found but no swap router is configured; skipping",
                sell,
                buy
            );
            return None;
        };
        Some(TransactionIntent {
            kind: TransactionKind::Swap,
            recipient: router.to_string(),
            amount: None,
            payload: None,
            description: format!("Swap {} for {}", sell, buy),
            swap: Some(SwapPair { sell, buy }),
        })
    }
}

// Internal helper that tries the whole text, then a fenced json block.
fn extract_structured(text: &str) -> Option<TransactionIntent> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        if let Some(intent) = intent_from_json(trimmed) {
            return Some(intent);
        }
    }
    fenced_json_regex()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .find_map(|block| intent_from_json(block.as_str()))
}

fn intent_from_json(raw: &str) -> Option<TransactionIntent> {
    let payload: StructuredPayload = match serde_json::from_str(raw) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::trace!("Structured payload rejected: {}", err);
            return None;
        }
    };
    let to = payload.to?.trim().to_string();
    if !is_evm_address(&to) {
        return None;
    }

    let kind = payload
        .kind
        .as_deref()
        .map(TransactionKind::from_label)
        .unwrap_or(TransactionKind::Custom);

    let raw_amount = payload
        .value
        .filter(|v| !v.is_null())
        .or(payload.amount.filter(|v| !v.is_null()));
    // Once `to` is usable the payload is authoritative; an unreadable amount is dropped.
    let amount = raw_amount.and_then(|raw| {
        let normalized = normalize_json_amount(&raw);
        if normalized.is_none() {
            tracing::warn!("Ignoring unreadable amount {} in structured payload", raw);
        }
        normalized
    });

    let payload_data = payload
        .data
        .filter(|_| kind == TransactionKind::ContractCall)
        .map(|data| data.trim().to_string())
        .filter(|data| is_hex_data(data));

    let description = payload
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| TransactionIntent::default_description(kind, &to));

    Some(TransactionIntent {
        kind,
        recipient: to,
        amount,
        payload: payload_data,
        description,
        swap: None,
    })
}

// JSON amounts are wei unless written with a decimal point. Numbers keep their source text.
fn normalize_json_amount(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Number(number) => normalize_amount(&number.to_string(), None),
        serde_json::Value::String(text) => {
            let text = text.trim();
            if let Some(hex_digits) = text.strip_prefix("0x") {
                U256::from_str_radix(hex_digits, 16)
                    .ok()
                    .map(|v| v.to_string())
            } else {
                normalize_amount(text, None)
            }
        }
        _ => None,
    }
}

/// Converts a textual amount to wei.
///
/// An explicit `eth` unit, or no unit with a decimal point, means whole coins (scaled by
/// 10^18). `wei`, or no unit without a decimal point, is taken as-is. Fractional wei is
/// rejected, and so is any amount more precise than one wei.
fn normalize_amount(raw: &str, unit: Option<&str>) -> Option<String> {
    let whole_coin = match unit.map(|u| u.to_ascii_lowercase()).as_deref() {
        Some("eth") => true,
        Some(_) => false,
        None => raw.contains('.'),
    };
    if whole_coin {
        let (int_part, frac_part) = raw.split_once('.').unwrap_or((raw, ""));
        let well_formed = !int_part.is_empty()
            && int_part.chars().all(|c| c.is_ascii_digit())
            && frac_part.chars().all(|c| c.is_ascii_digit());
        if !well_formed || frac_part.len() > ETHER_DECIMALS {
            return None;
        }
        return parse_ether(raw).ok().map(|wei| wei.to_string());
    }
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    U256::from_dec_str(raw).ok().map(|wei| wei.to_string())
}

fn extract_transfer(text: &str) -> Option<TransactionIntent> {
    let caps = transfer_regex().captures(text)?;
    let raw_amount = caps.get(1)?.as_str();
    let unit = caps.get(2).map(|m| m.as_str());
    let recipient = caps.get(3)?.as_str().to_string();
    let amount = normalize_amount(raw_amount, unit)?;

    let unit_label = match unit.map(|u| u.to_ascii_lowercase()).as_deref() {
        Some("eth") => "ETH",
        Some(_) => "wei",
        None if raw_amount.contains('.') => "ETH",
        None => "wei",
    };

    Some(TransactionIntent {
        kind: TransactionKind::Transfer,
        description: format!("Send {} {} to {}", raw_amount, unit_label, recipient),
        recipient,
        amount: Some(amount),
        payload: None,
        swap: None,
    })
}

fn extract_contract_call(text: &str) -> Option<TransactionIntent> {
    let caps = contract_call_regex().captures(text)?;
    let recipient = caps.get(1)?.as_str().to_string();
    let data = caps.get(2)?.as_str().to_string();
    Some(TransactionIntent {
        kind: TransactionKind::ContractCall,
        description: format!("Call contract {} with data {}", recipient, data),
        recipient,
        amount: None,
        payload: Some(data),
        swap: None,
    })
}

fn extract_bare_address(text: &str) -> Option<TransactionIntent> {
    let recipient = address_regex().find(text)?.as_str().to_string();
    Some(TransactionIntent {
        kind: TransactionKind::Custom,
        description: TransactionIntent::default_description(TransactionKind::Custom, &recipient),
        recipient,
        amount: None,
        payload: None,
        swap: None,
    })
}

fn is_hex_data(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .map(|body| !body.is_empty() && body.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}
