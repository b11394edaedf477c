use serde::Deserialize;
use std::env;

use crate::constants::{
    AGENT_TIMEOUT_MS, DEFAULT_EVM_CHAIN_ID, DEFAULT_EVM_NETWORK_NAME, DEFAULT_EVM_RPC_URL,
    DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL, MAX_INPUT_CHARS,
};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Agent (LLM)
    pub openai_api_key: Option<String>,
    pub openai_fallback_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub agent_timeout_ms: u64,
    pub max_input_chars: usize,

    // Wallet
    pub evm_rpc_url: String,
    pub evm_chain_id: u64,
    pub evm_network_name: String,
    pub wallet_private_key: Option<String>,
    pub swap_router_address: Option<String>,

    // Admin
    pub admin_manual_key: Option<String>,

    // CORS
    pub cors_allowed_origins: String,
}

// Internal helper that reads an optional variable, treating blank values as unset.
fn env_non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            openai_api_key: env_non_empty("OPENAI_API_KEY"),
            openai_fallback_api_key: env_non_empty("OPENAI_FALLBACK_API_KEY"),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string()),
            agent_timeout_ms: env::var("AGENT_TIMEOUT_MS")
                .unwrap_or_else(|_| AGENT_TIMEOUT_MS.to_string())
                .parse()?,
            max_input_chars: env::var("MAX_INPUT_CHARS")
                .unwrap_or_else(|_| MAX_INPUT_CHARS.to_string())
                .parse()?,

            evm_rpc_url: env::var("EVM_RPC_URL").unwrap_or_else(|_| DEFAULT_EVM_RPC_URL.to_string()),
            evm_chain_id: env::var("EVM_CHAIN_ID")
                .unwrap_or_else(|_| DEFAULT_EVM_CHAIN_ID.to_string())
                .parse()?,
            evm_network_name: env::var("EVM_NETWORK_NAME")
                .unwrap_or_else(|_| DEFAULT_EVM_NETWORK_NAME.to_string()),
            wallet_private_key: env_non_empty("WALLET_PRIVATE_KEY"),
            swap_router_address: env_non_empty("SWAP_ROUTER_ADDRESS"),

            admin_manual_key: env_non_empty("ADMIN_MANUAL_KEY"),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if url::Url::parse(&self.openai_base_url).is_err() {
            anyhow::bail!("OPENAI_BASE_URL is not a valid URL");
        }
        if url::Url::parse(&self.evm_rpc_url).is_err() {
            anyhow::bail!("EVM_RPC_URL is not a valid URL");
        }
        if self.agent_timeout_ms == 0 {
            anyhow::bail!("AGENT_TIMEOUT_MS must be > 0");
        }
        if self.max_input_chars == 0 {
            anyhow::bail!("MAX_INPUT_CHARS must be > 0");
        }

        if self.openai_api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY is not set; chat requests will be rejected");
        }
        if self.openai_api_key.is_none() && self.openai_fallback_api_key.is_some() {
            tracing::warn!("OPENAI_FALLBACK_API_KEY is set without a primary key; it will be used as primary");
        }
        if self.wallet_private_key.is_none() {
            tracing::warn!("WALLET_PRIVATE_KEY is not set; running in chat-only mode");
        }
        if self.swap_router_address.is_none() {
            tracing::warn!("SWAP_ROUTER_ADDRESS is not set; swap phrases will not produce intents");
        }
        if self.admin_manual_key.is_none() {
            tracing::warn!("ADMIN_MANUAL_KEY is not set; credential rotation endpoint is disabled");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn is_testnet(&self) -> bool {
        if self.environment == "development" || self.environment == "testnet" {
            return true;
        }
        let network = self.evm_network_name.to_ascii_lowercase();
        network.contains("sepolia") || network.contains("goerli") || network.contains("holesky")
    }

    /// Primary key first, then the fallback; a lone fallback key acts as primary.
    pub fn agent_api_keys(&self) -> Vec<String> {
        self.openai_api_key
            .iter()
            .chain(self.openai_fallback_api_key.iter())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 3000,
        environment: "development".to_string(),
        openai_api_key: Some("sk-primary".to_string()),
        openai_fallback_api_key: Some("sk-fallback".to_string()),
        openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        openai_model: DEFAULT_OPENAI_MODEL.to_string(),
        agent_timeout_ms: AGENT_TIMEOUT_MS,
        max_input_chars: MAX_INPUT_CHARS,
        evm_rpc_url: DEFAULT_EVM_RPC_URL.to_string(),
        evm_chain_id: DEFAULT_EVM_CHAIN_ID,
        evm_network_name: DEFAULT_EVM_NETWORK_NAME.to_string(),
        wallet_private_key: None,
        swap_router_address: None,
        admin_manual_key: Some("admin-secret".to_string()),
        cors_allowed_origins: "*".to_string(),
    }
}
