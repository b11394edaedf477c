use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod error;
mod models;
mod services;
mod utils;

use config::Config;
use constants::API_VERSION;
use services::{
    AgentBackend, AgentHandle, EvmWallet, IntentExtractor, OpenAiAgent, ShortcutTable,
    WalletExecutor,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "terminal_agent_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting terminal agent backend");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);

    // Shortcut table must be unambiguous before any request is served
    let shortcuts = ShortcutTable::builtin();
    shortcuts
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid shortcut table: {}", e))?;
    tracing::info!("Loaded {} shortcuts", shortcuts.rules().len());

    // Wallet (optional)
    let wallet: Option<Arc<dyn WalletExecutor>> = match EvmWallet::from_config(&config)? {
        Some(wallet) => {
            tracing::info!(
                "Wallet {} on {} ready",
                wallet.address(),
                wallet.network()
            );
            Some(Arc::new(wallet) as Arc<dyn WalletExecutor>)
        }
        None => None,
    };
    let wallet_context = wallet.as_ref().map(|w| services::WalletContext {
        address: w.address(),
        network: w.network(),
    });

    // Agent (optional until credentials are supplied)
    let agent: Option<Arc<dyn AgentBackend>> = if config.agent_api_keys().is_empty() {
        None
    } else {
        let agent = OpenAiAgent::from_config(&config, wallet_context.as_ref())?;
        tracing::info!("Agent backend: {}", agent.label());
        Some(Arc::new(agent) as Arc<dyn AgentBackend>)
    };

    let extractor = IntentExtractor::new(config.swap_router_address.clone());
    if let Some(router) = extractor.swap_router() {
        tracing::info!("Swap intents will be routed to {}", router);
    }

    let app_state = api::AppState {
        config: config.clone(),
        agent: AgentHandle::new(agent),
        wallet,
        shortcuts,
        extractor,
    };

    // Build router
    let app = build_router(app_state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Agent
        .route("/api/v1/agent/chat", post(api::agent::chat))
        .route("/api/v1/agent/resolve", post(api::agent::resolve_shortcut))
        .route("/api/v1/agent/extract", post(api::agent::extract_intent))
        .route("/api/v1/agent/shortcuts", get(api::agent::list_shortcuts))
        // Wallet
        .route("/api/v1/wallet", get(api::wallet::get_wallet))
        .route("/api/v1/wallet/execute", post(api::wallet::execute_intent))
        // Admin (credential rotation)
        .route(
            "/api/v1/admin/agent/credentials",
            post(api::admin::rotate_agent_credentials),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn router_builds_with_test_state() {
        // Memastikan router bisa dibangun dengan state uji
        let _router = build_router(api::test_state(None, None));
    }

    #[test]
    fn cors_from_config_accepts_origin_list() {
        let mut config = config::test_config();
        config.cors_allowed_origins = "http://localhost:3001, https://app.example".to_string();
        let _layer = cors_from_config(&config);
    }
}
