/// Application constants

// API version
pub const API_VERSION: &str = "v1";

// Input limits
pub const MAX_INPUT_CHARS: usize = 500;
pub const MAX_EXTRACT_INPUT_BYTES: usize = 16 * 1024;

// Agent call
pub const AGENT_TIMEOUT_MS: u64 = 30_000;
pub const AGENT_HTTP_TIMEOUT_SECS: u64 = 25;
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const AGENT_TEMPERATURE: f64 = 0.2;

// Wallet
pub const ETHER_DECIMALS: usize = 18;
pub const DEFAULT_EVM_CHAIN_ID: u64 = 84532; // base-sepolia
pub const DEFAULT_EVM_NETWORK_NAME: &str = "base-sepolia";
pub const DEFAULT_EVM_RPC_URL: &str = "https://sepolia.base.org";
