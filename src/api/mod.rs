// src/api/mod.rs

pub mod admin;
pub mod agent;
pub mod health;
pub mod wallet;

use std::sync::Arc;

use crate::config::Config;
use crate::services::{
    AgentHandle, ChatService, IntentExtractor, ShortcutTable, WalletContext, WalletExecutor,
};

// AppState definition
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub agent: AgentHandle,
    pub wallet: Option<Arc<dyn WalletExecutor>>,
    pub shortcuts: ShortcutTable,
    pub extractor: IntentExtractor,
}

impl AppState {
    pub fn chat_service(&self) -> ChatService {
        ChatService::new(
            self.agent.clone(),
            self.wallet.clone(),
            self.shortcuts,
            self.extractor.clone(),
            &self.config,
        )
    }

    pub fn wallet_context(&self) -> Option<WalletContext> {
        self.wallet.as_ref().map(|wallet| WalletContext {
            address: wallet.address(),
            network: wallet.network(),
        })
    }
}

#[cfg(test)]
pub(crate) fn test_state(
    agent: Option<Arc<dyn crate::services::AgentBackend>>,
    wallet: Option<Arc<dyn WalletExecutor>>,
) -> AppState {
    AppState {
        config: crate::config::test_config(),
        agent: AgentHandle::new(agent),
        wallet,
        shortcuts: ShortcutTable::builtin(),
        extractor: IntentExtractor::default(),
    }
}
