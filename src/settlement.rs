use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use ethers::types::{Address, U256};
use ethers::utils::format_ether;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::SettleError;
use crate::lifecycle::{classify, liveness_remaining, unix_now};
use crate::types::{
    BetEvent, EscrowAmounts, LifecycleState, MarketSnapshot, SettlementOutcome, SweepAction,
    SweepEntry, SweepReport, TxConfirmation,
};

/// The one seam to the chain. Everything the coordinator and ledger need is
/// behind this trait so they can run against an in-memory double in tests.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    async fn fetch_all_markets(&self) -> Result<Vec<MarketSnapshot>, SettleError>;
    async fn fetch_market(&self, market_id: u64) -> Result<MarketSnapshot, SettleError>;
    async fn latest_block(&self) -> Result<u64, SettleError>;
    async fn bet_events(
        &self,
        bettor: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<BetEvent>, SettleError>;

    async fn escrow_balance(&self) -> Result<U256, SettleError>;
    async fn native_balance(&self) -> Result<U256, SettleError>;
    async fn wrap_native(&self, amount: U256) -> Result<TxConfirmation, SettleError>;
    async fn approve_escrow(&self, amount: U256) -> Result<TxConfirmation, SettleError>;
    async fn request_settlement(
        &self,
        market_id: u64,
        reward: U256,
        bond: U256,
    ) -> Result<TxConfirmation, SettleError>;
    async fn settle_market(&self, market_id: u64) -> Result<SettlementOutcome, SettleError>;
}

/// Oracle cost model: how much reward and bond to escrow for a settlement
/// request. Operator policy, not a contract invariant.
pub trait EscrowPolicy: Send + Sync {
    fn escrow_amounts(&self, total_pool: U256) -> EscrowAmounts;
}

/// Flat floor, stepped up once the pool crosses a threshold.
pub struct TieredEscrow {
    pub base_reward: U256,
    pub base_bond: U256,
    pub scaled_reward: U256,
    pub scaled_bond: U256,
    pub pool_threshold: U256,
}

impl Default for TieredEscrow {
    fn default() -> Self {
        Self {
            // 0.02 / 0.05 WETH floor, 0.05 / 0.1 above a 1-ETH pool
            base_reward: U256::from(20_000_000_000_000_000u64),
            base_bond: U256::from(50_000_000_000_000_000u64),
            scaled_reward: U256::from(50_000_000_000_000_000u64),
            scaled_bond: U256::from(100_000_000_000_000_000u64),
            pool_threshold: U256::exp10(18),
        }
    }
}

impl EscrowPolicy for TieredEscrow {
    fn escrow_amounts(&self, total_pool: U256) -> EscrowAmounts {
        if total_pool > self.pool_threshold {
            EscrowAmounts {
                reward: self.scaled_reward,
                bond: self.scaled_bond,
            }
        } else {
            EscrowAmounts {
                reward: self.base_reward,
                bond: self.base_bond,
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Pause between settlement transactions, all signed by one key.
    pub settle_delay: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(5),
        }
    }
}

/// Drives markets through expired → requested → settled. Performs no retry
/// of its own: transient failures surface typed and the next sweep picks the
/// market up again from whatever state the chain reports.
pub struct Coordinator {
    gateway: Arc<dyn ChainGateway>,
    policy: Box<dyn EscrowPolicy>,
    config: SweepConfig,
    // serializes sweeps from the worker and the HTTP trigger
    sweep_lock: Mutex<()>,
}

impl Coordinator {
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        policy: Box<dyn EscrowPolicy>,
        config: SweepConfig,
    ) -> Self {
        Self {
            gateway,
            policy,
            config,
            sweep_lock: Mutex::new(()),
        }
    }

    /// Escrow reward+bond and submit the settlement request for an expired
    /// market. Safe to re-run after a failure: wrap and approve are
    /// idempotent up to balance checks, and nothing is recorded locally.
    pub async fn request_settlement(
        &self,
        market: &MarketSnapshot,
    ) -> Result<SweepAction, SettleError> {
        match classify(market, unix_now()) {
            LifecycleState::ExpiredAwaitingRequest => {}
            LifecycleState::Resolved => {
                return Err(SettleError::AlreadySettled {
                    market_id: market.market_id,
                })
            }
            state => {
                return Err(SettleError::Validation {
                    market_id: market.market_id,
                    reason: format!("cannot request settlement in state {state:?}"),
                })
            }
        }

        let escrow = self.policy.escrow_amounts(market.total_pool());
        tracing::info!(
            "market {}: requesting settlement, reward {} ETH, bond {} ETH",
            market.market_id,
            format_ether(escrow.reward),
            format_ether(escrow.bond),
        );

        self.ensure_escrow(&escrow).await?;
        let tx = self
            .gateway
            .request_settlement(market.market_id, escrow.reward, escrow.bond)
            .await?;

        // the chain is the source of truth, not the receipt
        let fresh = self.gateway.fetch_market(market.market_id).await?;
        if fresh.request_time == 0 {
            return Err(SettleError::Consistency {
                market_id: market.market_id,
                reason: "requestTime did not advance after request transaction".into(),
            });
        }

        Ok(SweepAction::Requested {
            reward: escrow.reward,
            bond: escrow.bond,
            tx_hash: tx.tx_hash,
        })
    }

    async fn ensure_escrow(&self, escrow: &EscrowAmounts) -> Result<(), SettleError> {
        let total = escrow.total();
        let balance = self.gateway.escrow_balance().await?;
        if balance < total {
            let shortfall = total - balance;
            let native = self.gateway.native_balance().await?;
            if native < shortfall {
                return Err(SettleError::InsufficientFunds {
                    required: shortfall,
                    available: native,
                });
            }
            self.gateway.wrap_native(shortfall).await?;
        }
        self.gateway.approve_escrow(total).await?;
        Ok(())
    }

    /// Execute settlement once the liveness window has elapsed. A race with
    /// another settler is success, not an error.
    pub async fn execute_settlement(
        &self,
        market: &MarketSnapshot,
    ) -> Result<SweepAction, SettleError> {
        match classify(market, unix_now()) {
            LifecycleState::ReadyToSettle => {}
            LifecycleState::Resolved => {
                return Ok(SweepAction::AlreadySettled {
                    outcome: market.outcome,
                })
            }
            state => {
                return Err(SettleError::Validation {
                    market_id: market.market_id,
                    reason: format!("cannot settle in state {state:?}"),
                })
            }
        }

        match self.gateway.settle_market(market.market_id).await {
            Ok(result) => {
                let outcome = match result.outcome {
                    Some(outcome) => outcome,
                    // event missing (indexer lag, ABI drift): the market
                    // fields decide
                    None => {
                        let fresh = self.gateway.fetch_market(market.market_id).await?;
                        if !fresh.is_resolved {
                            return Err(SettleError::Consistency {
                                market_id: market.market_id,
                                reason: "market still unresolved after settlement transaction"
                                    .into(),
                            });
                        }
                        fresh.outcome.unwrap_or_default()
                    }
                };
                tracing::info!(
                    "market {} settled, outcome option {}",
                    market.market_id,
                    outcome
                );
                Ok(SweepAction::Settled {
                    outcome,
                    tx_hash: result.tx.tx_hash,
                })
            }
            Err(SettleError::AlreadySettled { .. }) => {
                let fresh = self.gateway.fetch_market(market.market_id).await?;
                if !fresh.is_resolved {
                    return Err(SettleError::Consistency {
                        market_id: market.market_id,
                        reason: "settle reverted as already-resolved but market reads unresolved"
                            .into(),
                    });
                }
                tracing::info!(
                    "market {} was settled by another actor, outcome {:?}",
                    market.market_id,
                    fresh.outcome
                );
                Ok(SweepAction::AlreadySettled {
                    outcome: fresh.outcome,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Classify every market and perform whatever transition applies, one
    /// market at a time. Per-market failures are recorded in the report and
    /// do not abort the batch.
    pub async fn run_sweep(&self) -> Result<SweepReport, SettleError> {
        let _guard = self.sweep_lock.lock().await;
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let markets = self.gateway.fetch_all_markets().await?;
        tracing::info!("sweep {run_id}: scanning {} markets", markets.len());

        let mut entries = Vec::new();
        for market in &markets {
            let now = unix_now();
            let state = classify(market, now);
            let step = match state {
                LifecycleState::ExpiredAwaitingRequest => {
                    Some(self.request_settlement(market).await)
                }
                LifecycleState::ReadyToSettle => Some(self.execute_settlement(market).await),
                LifecycleState::AwaitingLiveness => {
                    tracing::debug!(
                        "market {}: liveness window, {}s remaining",
                        market.market_id,
                        liveness_remaining(market, now)
                    );
                    None
                }
                LifecycleState::Active | LifecycleState::Resolved => None,
            };

            let entry = match step {
                None => {
                    if state == LifecycleState::Active || state == LifecycleState::Resolved {
                        continue;
                    }
                    SweepEntry {
                        market_id: market.market_id,
                        state,
                        action: SweepAction::None,
                        error: None,
                    }
                }
                Some(Ok(action)) => SweepEntry {
                    market_id: market.market_id,
                    state,
                    action,
                    error: None,
                },
                Some(Err(e)) => {
                    tracing::warn!("sweep {run_id}: market {} failed: {e}", market.market_id);
                    SweepEntry {
                        market_id: market.market_id,
                        state,
                        action: SweepAction::None,
                        error: Some(e.to_string()),
                    }
                }
            };

            let acted = matches!(
                entry.action,
                SweepAction::Requested { .. } | SweepAction::Settled { .. }
            );
            entries.push(entry);
            if acted {
                tokio::time::sleep(self.config.settle_delay).await;
            }
        }

        Ok(SweepReport {
            run_id,
            started_at,
            scanned: markets.len(),
            entries,
        })
    }
}
