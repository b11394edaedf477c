// src/models/mod.rs
pub mod intent;
pub mod response;

// Re-export commonly used types so other modules can use `crate::models::X`
pub use intent::{is_evm_address, SwapPair, TransactionIntent, TransactionKind};
pub use response::ApiResponse;
