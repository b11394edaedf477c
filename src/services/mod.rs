// All service modules
pub mod agent_client;
pub mod chat;
pub mod intent_extractor;
pub mod shortcuts;
pub mod wallet;

// Re-export for convenience
pub use agent_client::{AgentBackend, AgentHandle, OpenAiAgent, WalletContext};
pub use chat::ChatService;
pub use intent_extractor::IntentExtractor;
pub use shortcuts::ShortcutTable;
pub use wallet::{EvmWallet, WalletExecutor};
