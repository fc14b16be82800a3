// src/eth/reader.rs

use ethers::contract::ContractError;
use ethers::prelude::*;

use super::client::{ContractFlavor, EthGateway, SignerClient};
use super::MarketView;
use crate::error::SettleError;
use crate::types::{BetEvent, MarketSnapshot};

impl EthGateway {
    /// Snapshot every market. Prefers the aggregate call and falls back to
    /// per-id reads when it fails (older deployments lack `getAllMarkets`).
    pub async fn fetch_all(&self) -> Result<Vec<MarketSnapshot>, SettleError> {
        match self.flavor {
            ContractFlavor::LegacyBinary => self.fetch_all_legacy().await,
            ContractFlavor::Multi => match self.contract.get_all_markets().call().await {
                Ok(views) => Ok(views.into_iter().map(snapshot_from_view).collect()),
                Err(e) => {
                    tracing::warn!("getAllMarkets failed ({e}), falling back to per-id reads");
                    self.fetch_all_by_id().await
                }
            },
        }
    }

    pub async fn fetch_by_id(&self, market_id: u64) -> Result<MarketSnapshot, SettleError> {
        match self.flavor {
            ContractFlavor::Multi => {
                let details = self
                    .contract
                    .get_market_details(U256::from(market_id))
                    .call()
                    .await
                    .map_err(read_err)?;
                Ok(snapshot_from_details(details))
            }
            ContractFlavor::LegacyBinary => {
                let game = self
                    .contract
                    .games(U256::from(market_id))
                    .call()
                    .await
                    .map_err(read_err)?;
                Ok(snapshot_from_game(market_id, game))
            }
        }
    }

    async fn fetch_all_by_id(&self) -> Result<Vec<MarketSnapshot>, SettleError> {
        let count = sat_u64(
            self.contract
                .market_count()
                .call()
                .await
                .map_err(read_err)?,
        );
        let mut markets = Vec::with_capacity(count as usize);
        // ids are assigned from 1
        for id in 1..=count {
            markets.push(self.fetch_by_id(id).await?);
        }
        Ok(markets)
    }

    async fn fetch_all_legacy(&self) -> Result<Vec<MarketSnapshot>, SettleError> {
        let count = sat_u64(self.contract.game_count().call().await.map_err(read_err)?);
        let mut markets = Vec::with_capacity(count as usize);
        for id in 1..=count {
            markets.push(self.fetch_by_id(id).await?);
        }
        Ok(markets)
    }

    pub async fn latest_block_number(&self) -> Result<u64, SettleError> {
        self.client
            .get_block_number()
            .await
            .map(|b| b.as_u64())
            .map_err(|e| SettleError::TransientRpc(e.to_string()))
    }

    pub async fn query_bet_events(
        &self,
        bettor: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<BetEvent>, SettleError> {
        let events = self
            .contract
            .bet_placed_filter()
            .from_block(from_block)
            .to_block(to_block)
            .topic1(H256::from(bettor))
            .query()
            .await
            .map_err(read_err)?;

        Ok(events
            .into_iter()
            .map(|ev| BetEvent {
                market_id: sat_u64(ev.market_id),
                bettor: ev.bettor,
                option_index: sat_u32(ev.option_index),
                amount: ev.amount,
                timestamp: sat_u64(ev.timestamp),
            })
            .collect())
    }
}

fn read_err(e: ContractError<SignerClient>) -> SettleError {
    SettleError::TransientRpc(e.to_string())
}

fn snapshot_from_view(v: MarketView) -> MarketSnapshot {
    let is_resolved = v.is_resolved;
    MarketSnapshot {
        market_id: sat_u64(v.market_id),
        description: v.description,
        creator: v.creator,
        expiration_date: sat_u64(v.expiration_date),
        verification_time: sat_u64(v.verification_time),
        is_resolved,
        option_amounts: v.option_amounts,
        request_time: sat_u64(v.request_time),
        outcome: is_resolved.then(|| sat_u32(v.outcome)),
        category: v.category,
        image_url: v.image_url,
        option_count: sat_u64(v.option_count) as u32,
    }
}

type MarketDetails = (
    U256,
    String,
    Address,
    U256,
    U256,
    bool,
    Vec<U256>,
    U256,
    U256,
    u8,
    String,
    U256,
);

fn snapshot_from_details(d: MarketDetails) -> MarketSnapshot {
    let (
        market_id,
        description,
        creator,
        expiration_date,
        verification_time,
        is_resolved,
        option_amounts,
        request_time,
        outcome,
        category,
        image_url,
        option_count,
    ) = d;
    MarketSnapshot {
        market_id: sat_u64(market_id),
        description,
        creator,
        expiration_date: sat_u64(expiration_date),
        verification_time: sat_u64(verification_time),
        is_resolved,
        option_amounts,
        request_time: sat_u64(request_time),
        outcome: is_resolved.then(|| sat_u32(outcome)),
        category,
        image_url,
        option_count: sat_u64(option_count) as u32,
    }
}

type LegacyGame = (String, Address, U256, U256, U256, U256, U256, bool, bool);

/// Adapt a legacy binary game into the option-indexed shape:
/// option 0 = NO, option 1 = YES.
pub(crate) fn snapshot_from_game(game_id: u64, g: LegacyGame) -> MarketSnapshot {
    let (
        description,
        creator,
        total_yes,
        total_no,
        expiration_date,
        verification_time,
        request_time,
        is_resolved,
        outcome,
    ) = g;
    MarketSnapshot {
        market_id: game_id,
        description,
        creator,
        expiration_date: sat_u64(expiration_date),
        verification_time: sat_u64(verification_time),
        is_resolved,
        option_amounts: vec![total_no, total_yes],
        request_time: sat_u64(request_time),
        outcome: is_resolved.then_some(u32::from(outcome)),
        category: 0,
        image_url: String::new(),
        option_count: 2,
    }
}

pub(crate) fn sat_u64(x: U256) -> u64 {
    if x > U256::from(u64::MAX) {
        u64::MAX
    } else {
        x.as_u64()
    }
}

pub(crate) fn sat_u32(x: U256) -> u32 {
    if x > U256::from(u32::MAX) {
        u32::MAX
    } else {
        x.as_u32()
    }
}
