use async_trait::async_trait;
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, Bytes, TransactionRequest, U256},
};
use std::str::FromStr;

use crate::{
    config::Config,
    error::{AppError, Result},
    models::{TransactionIntent, TransactionKind},
};

/// Signs and broadcasts transactions described by an intent.
#[async_trait]
pub trait WalletExecutor: Send + Sync {
    fn address(&self) -> String;

    fn network(&self) -> String;

    /// Native balance in wei.
    async fn balance_wei(&self) -> Result<String>;

    /// Returns the transaction hash.
    async fn execute(&self, intent: &TransactionIntent) -> Result<String>;
}

pub struct EvmWallet {
    client: SignerMiddleware<Provider<Http>, LocalWallet>,
    network: String,
}

impl EvmWallet {
    pub fn new(rpc_url: &str, private_key: &str, chain_id: u64, network: String) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| AppError::Internal(format!("Invalid EVM RPC URL: {}", e)))?;
        let signer = private_key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|_| AppError::Internal("WALLET_PRIVATE_KEY is not a valid key".to_string()))?
            .with_chain_id(chain_id);
        Ok(Self {
            client: SignerMiddleware::new(provider, signer),
            network,
        })
    }

    /// `None` when no private key is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>> {
        let Some(private_key) = config.wallet_private_key.as_deref() else {
            return Ok(None);
        };
        Self::new(
            &config.evm_rpc_url,
            private_key,
            config.evm_chain_id,
            config.evm_network_name.clone(),
        )
        .map(Some)
    }
}

#[async_trait]
impl WalletExecutor for EvmWallet {
    fn address(&self) -> String {
        format!("{:#x}", self.client.address())
    }

    fn network(&self) -> String {
        self.network.clone()
    }

    async fn balance_wei(&self) -> Result<String> {
        let balance = self
            .client
            .get_balance(self.client.address(), None)
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))?;
        Ok(balance.to_string())
    }

    async fn execute(&self, intent: &TransactionIntent) -> Result<String> {
        let tx = build_transaction_request(intent)?;
        tracing::info!(
            "Executing {} intent: to={} amount={:?}",
            intent.kind,
            intent.recipient,
            intent.amount
        );
        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))?;
        let tx_hash = format!("{:#x}", pending.tx_hash());
        tracing::info!("Transaction submitted: {}", tx_hash);
        Ok(tx_hash)
    }
}

/// Turns a validated intent into an unsigned transaction request.
///
/// Swap intents carry only the token pair, not router calldata, so they are refused.
pub fn build_transaction_request(intent: &TransactionIntent) -> Result<TransactionRequest> {
    intent.validate()?;
    if intent.kind == TransactionKind::Swap {
        return Err(AppError::BadRequest(
            "swap execution is not supported".to_string(),
        ));
    }
    let to = Address::from_str(&intent.recipient)
        .map_err(|_| AppError::InvalidAddress(intent.recipient.clone()))?;

    let mut tx = TransactionRequest::new().to(to);
    if let Some(amount) = &intent.amount {
        let value = U256::from_dec_str(amount)
            .map_err(|_| AppError::BadRequest(format!("amount out of range: {}", amount)))?;
        tx = tx.value(value);
    }
    if let Some(payload) = &intent.payload {
        let bytes = hex::decode(payload.trim_start_matches("0x"))
            .map_err(|e| AppError::BadRequest(format!("payload is not valid hex: {}", e)))?;
        tx = tx.data(Bytes::from(bytes));
    }
    Ok(tx)
}
