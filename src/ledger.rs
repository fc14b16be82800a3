use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::DateTime;
use ethers::types::{Address, I256, U256};

use crate::error::SettleError;
use crate::lifecycle::{classify, unix_now};
use crate::odds::realized_profit;
use crate::settlement::ChainGateway;
use crate::types::{BetHistory, BetRecord, BetStatistics, BetStatus};

/// Joins a bettor's `BetPlaced` events against market resolution state over a
/// bounded block window. Full-history scans are unbounded cost, hence the
/// lookback.
pub struct BetLedger {
    gateway: Arc<dyn ChainGateway>,
    lookback_blocks: u64,
}

impl BetLedger {
    pub fn new(gateway: Arc<dyn ChainGateway>, lookback_blocks: u64) -> Self {
        Self {
            gateway,
            lookback_blocks,
        }
    }

    pub async fn user_bet_history(&self, bettor: Address) -> Result<BetHistory, SettleError> {
        let to_block = self.gateway.latest_block().await?;
        let from_block = to_block.saturating_sub(self.lookback_blocks);

        let events = self.gateway.bet_events(bettor, from_block, to_block).await?;
        tracing::debug!(
            "found {} bet events for {bettor:?} in blocks {from_block}..{to_block}",
            events.len()
        );

        let now = unix_now();
        let mut snapshots = HashMap::new();
        let mut bets = Vec::with_capacity(events.len());

        for event in events {
            // one read per distinct market, not per bet
            let market = match snapshots.entry(event.market_id) {
                Entry::Occupied(e) => e.into_mut(),
                Entry::Vacant(v) => v.insert(self.gateway.fetch_market(event.market_id).await?),
            };

            let status = BetStatus::from(classify(market, now));
            let (outcome, profit) = if market.is_resolved {
                let won = market.outcome == Some(event.option_index);
                let profit = realized_profit(
                    &market.option_amounts,
                    event.option_index as usize,
                    event.amount,
                    won,
                );
                (market.outcome, Some(profit))
            } else {
                (None, None)
            };

            bets.push(BetRecord {
                market_id: event.market_id,
                description: market.description.clone(),
                option_index: event.option_index,
                amount: event.amount,
                placed_at: DateTime::from_timestamp(event.timestamp.min(i64::MAX as u64) as i64, 0)
                    .unwrap_or_default(),
                expiration_date: market.expiration_date,
                status,
                outcome,
                profit,
            });
        }

        let stats = aggregate(&bets);
        Ok(BetHistory {
            bettor,
            from_block,
            to_block,
            bets,
            stats,
        })
    }
}

pub fn aggregate(bets: &[BetRecord]) -> BetStatistics {
    let total_staked = bets
        .iter()
        .fold(U256::zero(), |acc, b| acc + b.amount);
    let total_profit = bets
        .iter()
        .filter_map(|b| b.profit)
        .fold(I256::zero(), |acc, p| acc + p);
    let resolved = bets
        .iter()
        .filter(|b| b.status == BetStatus::Resolved)
        .count();
    let wins = bets
        .iter()
        .filter(|b| b.profit.is_some_and(|p| p > I256::zero()))
        .count();
    // undefined with nothing resolved, not 0%
    let win_rate = (resolved > 0).then(|| wins as f64 / resolved as f64);

    BetStatistics {
        total_bets: bets.len(),
        total_staked,
        total_profit,
        resolved,
        wins,
        win_rate,
    }
}
