use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Config,
    error::{AppError, Result},
    models::TransactionIntent,
    services::{
        agent_client::AgentHandle,
        intent_extractor::{IntentExtractor, Strategy},
        shortcuts::ShortcutTable,
        wallet::WalletExecutor,
    },
    utils::cap_user_input,
};

const AGENT_TIMEOUT_MESSAGE: &str =
    "The agent is taking too long right now. Please retry in a few seconds.";
const BARE_ADDRESS_NOT_EXECUTED: &str =
    "Only an address was recognised; restate the transaction with an amount or call data to execute it";

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    pub instruction: String,
    pub reply: String,
    pub timed_out: bool,
    pub intent: Option<TransactionIntent>,
    pub matched_by: Option<Strategy>,
    pub execution: Option<ExecutionOutcome>,
    pub responded_at: DateTime<Utc>,
}

/// Chat pipeline: shortcut expansion, agent round trip, intent extraction, optional execution.
pub struct ChatService {
    agent: AgentHandle,
    wallet: Option<Arc<dyn WalletExecutor>>,
    shortcuts: ShortcutTable,
    extractor: IntentExtractor,
    agent_timeout: Duration,
    max_input_chars: usize,
}

impl ChatService {
    pub fn new(
        agent: AgentHandle,
        wallet: Option<Arc<dyn WalletExecutor>>,
        shortcuts: ShortcutTable,
        extractor: IntentExtractor,
        config: &Config,
    ) -> Self {
        Self {
            agent,
            wallet,
            shortcuts,
            extractor,
            agent_timeout: Duration::from_millis(config.agent_timeout_ms),
            max_input_chars: config.max_input_chars,
        }
    }

    pub async fn process(&self, message: &str, execute: bool) -> Result<ChatOutcome> {
        let input = cap_user_input(message, self.max_input_chars)?;
        let instruction = self.shortcuts.resolve(&input);
        if instruction != input {
            tracing::debug!("Shortcut '{}' expanded to '{}'", input.trim(), instruction);
        }

        let agent = self.agent.current().await?;
        let (reply, timed_out) =
            match tokio::time::timeout(self.agent_timeout, agent.generate(&instruction)).await {
                Ok(Ok(reply)) => (reply, false),
                Ok(Err(err)) => return Err(err),
                Err(_) => {
                    tracing::warn!(
                        "Agent {} timed out after {}ms",
                        agent.label(),
                        self.agent_timeout.as_millis()
                    );
                    (AGENT_TIMEOUT_MESSAGE.to_string(), true)
                }
            };

        let from_reply = if timed_out {
            None
        } else {
            self.extractor.extract_detailed(&reply)
        };
        let extraction =
            from_reply.or_else(|| self.extractor.extract_detailed(&instruction));

        let (intent, matched_by) = match extraction {
            Some(found) => (Some(found.intent), Some(found.strategy)),
            None => (None, None),
        };

        let execution = match (&intent, execute) {
            (Some(_), true) if !timed_out && matched_by == Some(Strategy::BareAddress) => {
                tracing::info!("Skipping execution of bare-address intent");
                Some(ExecutionOutcome {
                    success: false,
                    tx_hash: None,
                    error: Some(BARE_ADDRESS_NOT_EXECUTED.to_string()),
                })
            }
            (Some(intent), true) if !timed_out => Some(self.execute_intent(intent).await),
            _ => None,
        };

        Ok(ChatOutcome {
            instruction,
            reply,
            timed_out,
            intent,
            matched_by,
            execution,
            responded_at: Utc::now(),
        })
    }

    /// Wallet failures are reported in the outcome rather than failing the chat turn.
    pub async fn execute_intent(&self, intent: &TransactionIntent) -> ExecutionOutcome {
        let result = match &self.wallet {
            Some(wallet) => wallet.execute(intent).await,
            None => Err(AppError::WalletNotConfigured),
        };
        match result {
            Ok(tx_hash) => ExecutionOutcome {
                success: true,
                tx_hash: Some(tx_hash),
                error: None,
            },
            Err(err) => {
                tracing::warn!("Intent execution failed: {}", err);
                ExecutionOutcome {
                    success: false,
                    tx_hash: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::models::TransactionKind;
    use crate::services::agent_client::AgentBackend;
    use async_trait::async_trait;
    use std::sync::Mutex;

    pub(crate) const ADDR: &str = "0x1111111111111111111111111111111111111111";

    /// Replies with a fixed text and records every prompt it receives.
    pub(crate) struct ScriptedAgent {
        pub reply: String,
        pub delay: Option<Duration>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedAgent {
        pub(crate) fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                delay: None,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AgentBackend for ScriptedAgent {
        async fn generate(&self, message: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(message.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.reply.clone())
        }

        fn label(&self) -> String {
            "scripted".to_string()
        }
    }

    pub(crate) struct StubWallet;

    #[async_trait]
    impl WalletExecutor for StubWallet {
        fn address(&self) -> String {
            "0x9999999999999999999999999999999999999999".to_string()
        }

        fn network(&self) -> String {
            "stubnet".to_string()
        }

        async fn balance_wei(&self) -> Result<String> {
            Ok("1000".to_string())
        }

        async fn execute(&self, intent: &TransactionIntent) -> Result<String> {
            intent.validate()?;
            Ok("0xfeed".to_string())
        }
    }

    fn service(agent: Arc<ScriptedAgent>, wallet: Option<Arc<dyn WalletExecutor>>) -> ChatService {
        ChatService::new(
            AgentHandle::new(Some(agent as Arc<dyn AgentBackend>)),
            wallet,
            ShortcutTable::builtin(),
            IntentExtractor::default(),
            &test_config(),
        )
    }

    #[tokio::test]
    async fn shortcut_is_expanded_before_agent_call() {
        // Memastikan alias diperluas sebelum dikirim ke agent
        let agent = Arc::new(ScriptedAgent::new("Your balance is 1 ETH."));
        let outcome = service(agent.clone(), None).process("bal", false).await.unwrap();
        assert_eq!(outcome.instruction, "Check my wallet balance");
        assert_eq!(
            *agent.prompts.lock().unwrap(),
            vec!["Check my wallet balance".to_string()]
        );
        assert_eq!(outcome.intent, None);
        assert!(outcome.execution.is_none());
    }

    #[tokio::test]
    async fn intent_is_extracted_from_agent_reply() {
        let reply = format!("Okay, I will send 0.1 eth to {}.", ADDR);
        let agent = Arc::new(ScriptedAgent::new(&reply));
        let outcome = service(agent, None).process("pay my friend", false).await.unwrap();
        let intent = outcome.intent.unwrap();
        assert_eq!(intent.kind, TransactionKind::Transfer);
        assert_eq!(intent.amount.as_deref(), Some("100000000000000000"));
        assert_eq!(outcome.matched_by, Some(Strategy::TransferPhrase));
    }

    #[tokio::test]
    async fn falls_back_to_user_instruction_for_intent() {
        let agent = Arc::new(ScriptedAgent::new("Sure, preparing that now."));
        let message = format!("tx 5 to {}", ADDR);
        let outcome = service(agent, None).process(&message, false).await.unwrap();
        assert_eq!(outcome.instruction, format!("Send 5 to {}", ADDR));
        assert_eq!(outcome.intent.unwrap().amount.as_deref(), Some("5"));
    }

    #[tokio::test]
    async fn execution_reports_hash_from_wallet() {
        let reply = format!("send 1 wei to {}", ADDR);
        let agent = Arc::new(ScriptedAgent::new(&reply));
        let outcome = service(agent, Some(Arc::new(StubWallet)))
            .process("go", true)
            .await
            .unwrap();
        let execution = outcome.execution.unwrap();
        assert!(execution.success);
        assert_eq!(execution.tx_hash.as_deref(), Some("0xfeed"));
    }

    #[tokio::test]
    async fn execution_without_wallet_is_reported_not_raised() {
        let reply = format!("send 1 wei to {}", ADDR);
        let agent = Arc::new(ScriptedAgent::new(&reply));
        let outcome = service(agent, None).process("go", true).await.unwrap();
        let execution = outcome.execution.unwrap();
        assert!(!execution.success);
        assert_eq!(execution.error.as_deref(), Some("Wallet not configured"));
    }

    #[tokio::test]
    async fn bare_address_in_question_is_never_executed() {
        // Memastikan alamat yang hanya disebut tidak memicu transaksi
        let reply = format!("The balance of {} is 3 ETH.", ADDR);
        let agent = Arc::new(ScriptedAgent::new(&reply));
        let message = format!("what is the balance of {}", ADDR);
        let outcome = service(agent, Some(Arc::new(StubWallet)))
            .process(&message, true)
            .await
            .unwrap();
        assert_eq!(outcome.matched_by, Some(Strategy::BareAddress));
        let execution = outcome.execution.unwrap();
        assert!(!execution.success);
        assert_eq!(execution.tx_hash, None);
        assert_eq!(execution.error.as_deref(), Some(BARE_ADDRESS_NOT_EXECUTED));
    }

    #[tokio::test]
    async fn timeout_returns_friendly_message() {
        let mut agent = ScriptedAgent::new(&format!("send 1 wei to {}", ADDR));
        agent.delay = Some(Duration::from_millis(200));
        let mut config = test_config();
        config.agent_timeout_ms = 10;
        let chat = ChatService::new(
            AgentHandle::new(Some(Arc::new(agent))),
            Some(Arc::new(StubWallet)),
            ShortcutTable::builtin(),
            IntentExtractor::default(),
            &config,
        );
        let outcome = chat.process("hello", true).await.unwrap();
        assert!(outcome.timed_out);
        assert_eq!(outcome.reply, AGENT_TIMEOUT_MESSAGE);
        assert!(outcome.intent.is_none());
        assert!(outcome.execution.is_none());
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let agent = Arc::new(ScriptedAgent::new("unused"));
        let result = service(agent, None).process("   ", false).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn missing_agent_is_reported() {
        let chat = ChatService::new(
            AgentHandle::new(None),
            None,
            ShortcutTable::builtin(),
            IntentExtractor::default(),
            &test_config(),
        );
        let result = chat.process("bal", false).await;
        assert!(matches!(result, Err(AppError::AgentNotConfigured)));
    }
}
