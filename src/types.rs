use chrono::{DateTime, Utc};
use ethers::types::{Address, H256, I256, U256};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Normalized on-chain view of one market. Legacy binary Yes/No markets are
/// mapped into this shape at the read boundary with
/// `option_amounts = [no_pool, yes_pool]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub market_id: u64,
    pub description: String,
    pub creator: Address,
    /// Unix seconds. Betting is valid only while `now < expiration_date`.
    pub expiration_date: u64,
    /// Oracle liveness window in seconds, authoritative per market.
    pub verification_time: u64,
    pub is_resolved: bool,
    /// Pool per option, wei.
    pub option_amounts: Vec<U256>,
    /// 0 until a settlement request lands on chain.
    pub request_time: u64,
    pub outcome: Option<u32>,
    pub category: u8,
    pub image_url: String,
    pub option_count: u32,
}

impl MarketSnapshot {
    pub fn total_pool(&self) -> U256 {
        self.option_amounts
            .iter()
            .fold(U256::zero(), |acc, a| acc + *a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Active,
    ExpiredAwaitingRequest,
    AwaitingLiveness,
    ReadyToSettle,
    Resolved,
}

/// Coarse user-facing status for bet history rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BetStatus {
    Active,
    Expired,
    Resolved,
}

impl From<LifecycleState> for BetStatus {
    fn from(state: LifecycleState) -> Self {
        match state {
            LifecycleState::Active => BetStatus::Active,
            LifecycleState::Resolved => BetStatus::Resolved,
            LifecycleState::ExpiredAwaitingRequest
            | LifecycleState::AwaitingLiveness
            | LifecycleState::ReadyToSettle => BetStatus::Expired,
        }
    }
}

/// One decoded `BetPlaced` log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetEvent {
    pub market_id: u64,
    pub bettor: Address,
    pub option_index: u32,
    pub amount: U256,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BetRecord {
    pub market_id: u64,
    pub description: String,
    pub option_index: u32,
    pub amount: U256,
    pub placed_at: DateTime<Utc>,
    pub expiration_date: u64,
    pub status: BetStatus,
    pub outcome: Option<u32>,
    /// Realized profit, present only once the market is resolved.
    pub profit: Option<I256>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BetStatistics {
    pub total_bets: usize,
    pub total_staked: U256,
    pub total_profit: I256,
    pub resolved: usize,
    pub wins: usize,
    /// None when no bet has resolved yet; serialized as null, never 0%.
    pub win_rate: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BetHistory {
    pub bettor: Address,
    pub from_block: u64,
    pub to_block: u64,
    pub bets: Vec<BetRecord>,
    pub stats: BetStatistics,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EscrowAmounts {
    pub reward: U256,
    pub bond: U256,
}

impl EscrowAmounts {
    pub fn total(&self) -> U256 {
        self.reward + self.bond
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TxConfirmation {
    pub tx_hash: H256,
    pub block_number: u64,
}

/// Result of a settlement-execution transaction. `outcome` is taken from the
/// resolution event when present; callers fall back to re-reading the market.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementOutcome {
    pub tx: TxConfirmation,
    pub outcome: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SweepAction {
    None,
    Requested {
        reward: U256,
        bond: U256,
        tx_hash: H256,
    },
    Settled {
        outcome: u32,
        tx_hash: H256,
    },
    AlreadySettled {
        outcome: Option<u32>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepEntry {
    pub market_id: u64,
    pub state: LifecycleState,
    pub action: SweepAction,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub scanned: usize,
    pub entries: Vec<SweepEntry>,
}
