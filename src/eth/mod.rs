// src/eth/mod.rs

use async_trait::async_trait;
use ethers::prelude::*;

pub mod client;
pub mod reader;
pub mod submit;

use crate::error::SettleError;
use crate::settlement::ChainGateway;
use crate::types::{BetEvent, MarketSnapshot, SettlementOutcome, TxConfirmation};
use client::EthGateway;

abigen!(BettingContract, "./abi/BettingContract.json");
abigen!(Weth, "./abi/WETH.json");

#[async_trait]
impl ChainGateway for EthGateway {
    async fn fetch_all_markets(&self) -> Result<Vec<MarketSnapshot>, SettleError> {
        self.fetch_all().await
    }

    async fn fetch_market(&self, market_id: u64) -> Result<MarketSnapshot, SettleError> {
        self.fetch_by_id(market_id).await
    }

    async fn latest_block(&self) -> Result<u64, SettleError> {
        self.latest_block_number().await
    }

    async fn bet_events(
        &self,
        bettor: Address,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<BetEvent>, SettleError> {
        self.query_bet_events(bettor, from_block, to_block).await
    }

    async fn escrow_balance(&self) -> Result<U256, SettleError> {
        self.weth_balance().await
    }

    async fn native_balance(&self) -> Result<U256, SettleError> {
        self.operator_native_balance().await
    }

    async fn wrap_native(&self, amount: U256) -> Result<TxConfirmation, SettleError> {
        self.wrap(amount).await
    }

    async fn approve_escrow(&self, amount: U256) -> Result<TxConfirmation, SettleError> {
        self.approve(amount).await
    }

    async fn request_settlement(
        &self,
        market_id: u64,
        reward: U256,
        bond: U256,
    ) -> Result<TxConfirmation, SettleError> {
        self.send_settlement_request(market_id, reward, bond).await
    }

    async fn settle_market(&self, market_id: u64) -> Result<SettlementOutcome, SettleError> {
        self.send_settlement(market_id).await
    }
}
