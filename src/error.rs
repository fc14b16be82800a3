use ethers::types::U256;
use thiserror::Error;

/// Typed failure taxonomy for the settlement flows. Transient RPC errors are
/// the only retryable class; the sweep loop retries them on its next tick.
#[derive(Debug, Error)]
pub enum SettleError {
    #[error("configuration: {0}")]
    Configuration(String),

    #[error("market {market_id} not in required state: {reason}")]
    Validation { market_id: u64, reason: String },

    #[error("insufficient escrow funds: need {required} wei, have {available} wei")]
    InsufficientFunds { required: U256, available: U256 },

    #[error("transaction failed for market {market_id}: {reason}")]
    TransactionFailed { market_id: u64, reason: String },

    #[error("transient rpc error: {0}")]
    TransientRpc(String),

    #[error("market {market_id} already resolved")]
    AlreadySettled { market_id: u64 },

    #[error("chain state inconsistency for market {market_id}: {reason}")]
    Consistency { market_id: u64, reason: String },
}

impl SettleError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SettleError::TransientRpc(_))
    }
}
