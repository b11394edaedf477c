use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::{
    config::Config,
    constants::{AGENT_HTTP_TIMEOUT_SECS, AGENT_TEMPERATURE},
    error::{AppError, Result},
};

/// Opaque text-in/text-out agent.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    async fn generate(&self, message: &str) -> Result<String>;

    fn label(&self) -> String;
}

/// Wallet facts the agent is told about in its system prompt.
#[derive(Debug, Clone)]
pub struct WalletContext {
    pub address: String,
    pub network: String,
}

fn build_system_prompt(wallet: Option<&WalletContext>) -> String {
    let mut prompt = String::from(
        "You are a terminal assistant that helps the user manage an on-chain wallet. \
         Answer briefly. When the user asks for a transaction, restate it in exactly one of \
         these forms so it can be executed: \
         'send <amount> eth to <0x address>', \
         'swap <TOKEN> for <TOKEN>', \
         'call contract <0x address> with data <0x hex>', \
         or a JSON object with the fields to, value, data, type and description.",
    );
    match wallet {
        Some(ctx) => prompt.push_str(&format!(
            " The user's wallet address is {} on network {}.",
            ctx.address, ctx.network
        )),
        None => prompt.push_str(" No wallet is connected, so transactions cannot be executed yet."),
    }
    prompt
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

/// OpenAI-compatible chat completion client with an optional fallback API key.
#[derive(Clone)]
pub struct OpenAiAgent {
    client: Client,
    base_url: String,
    model: String,
    api_keys: Vec<String>,
    system_prompt: String,
}

impl OpenAiAgent {
    pub fn new(
        base_url: String,
        model: String,
        api_keys: Vec<String>,
        wallet: Option<&WalletContext>,
    ) -> Result<Self> {
        if api_keys.is_empty() {
            return Err(AppError::AgentNotConfigured);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(AGENT_HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            model,
            api_keys,
            system_prompt: build_system_prompt(wallet),
        })
    }

    pub fn from_config(config: &Config, wallet: Option<&WalletContext>) -> Result<Self> {
        Self::new(
            config.openai_base_url.clone(),
            config.openai_model.clone(),
            config.agent_api_keys(),
            wallet,
        )
    }

    async fn call_with_key(&self, api_key: String, message: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "model": &self.model,
            "messages": [
                { "role": "system", "content": &self.system_prompt },
                { "role": "user", "content": message }
            ],
            "temperature": AGENT_TEMPERATURE,
        });

        let response = self
            .client
            .post(url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("Agent request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &detail));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| AppError::ExternalAPI(format!("Invalid agent response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::ExternalAPI("Agent returned no content".to_string()))
    }
}

#[async_trait]
impl AgentBackend for OpenAiAgent {
    async fn generate(&self, message: &str) -> Result<String> {
        with_key_fallback(&self.api_keys, |key| self.call_with_key(key, message)).await
    }

    fn label(&self) -> String {
        format!("openai:{}", self.model)
    }
}

fn classify_status(status: StatusCode, detail: &str) -> AppError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => AppError::RateLimitExceeded,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AppError::AuthError(format!("Agent rejected credentials ({})", status))
        }
        _ => {
            let lower = detail.to_ascii_lowercase();
            if lower.contains("rate limit") || lower.contains("quota") {
                AppError::RateLimitExceeded
            } else {
                AppError::ExternalAPI(format!("Agent API error {}: {}", status, detail))
            }
        }
    }
}

// Internal helper that decides whether another key is worth trying.
fn should_rotate_key(err: &AppError) -> bool {
    matches!(err, AppError::RateLimitExceeded | AppError::AuthError(_))
}

/// Runs `call` with each key in order, moving on only after rate-limit or credential errors.
pub async fn with_key_fallback<F, Fut>(keys: &[String], mut call: F) -> Result<String>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let mut last_err = AppError::AgentNotConfigured;
    for (idx, key) in keys.iter().enumerate() {
        match call(key.clone()).await {
            Ok(text) => {
                if idx > 0 {
                    tracing::info!("Agent call succeeded with fallback key #{}", idx);
                }
                return Ok(text);
            }
            Err(err) if should_rotate_key(&err) && idx + 1 < keys.len() => {
                tracing::warn!("Agent call failed with key #{} ({}); trying fallback key", idx, err);
                last_err = err;
            }
            Err(err) => return Err(err),
        }
    }
    Err(last_err)
}

/// Shared, explicitly owned agent handle. Credential rotation swaps the backend in place.
#[derive(Clone)]
pub struct AgentHandle {
    inner: Arc<RwLock<Option<Arc<dyn AgentBackend>>>>,
}

impl AgentHandle {
    pub fn new(backend: Option<Arc<dyn AgentBackend>>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(backend)),
        }
    }

    pub async fn current(&self) -> Result<Arc<dyn AgentBackend>> {
        self.inner
            .read()
            .await
            .clone()
            .ok_or(AppError::AgentNotConfigured)
    }

    pub async fn is_configured(&self) -> bool {
        self.inner.read().await.is_some()
    }

    pub async fn replace(&self, backend: Arc<dyn AgentBackend>) {
        let label = backend.label();
        *self.inner.write().await = Some(backend);
        tracing::info!("Agent backend re-initialized: {}", label);
    }
}
