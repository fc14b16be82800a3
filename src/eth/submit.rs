// src/eth/submit.rs

use ethers::abi::{Detokenize, RawLog};
use ethers::contract::{ContractCall, ContractError, EthLogDecode};
use ethers::prelude::*;
use ethers::utils::format_ether;

use super::client::{ContractFlavor, EthGateway, SignerClient};
use super::reader::sat_u32;
use super::{BettingContractErrors, GameResolvedFilter, MarketResolvedFilter};
use crate::error::SettleError;
use crate::types::{SettlementOutcome, TxConfirmation};

impl EthGateway {
    pub async fn weth_balance(&self) -> Result<U256, SettleError> {
        self.weth
            .balance_of(self.operator)
            .call()
            .await
            .map_err(|e| SettleError::TransientRpc(e.to_string()))
    }

    pub async fn operator_native_balance(&self) -> Result<U256, SettleError> {
        self.client
            .get_balance(self.operator, None)
            .await
            .map_err(|e| SettleError::TransientRpc(e.to_string()))
    }

    pub async fn wrap(&self, amount: U256) -> Result<TxConfirmation, SettleError> {
        tracing::info!("wrapping {} ETH into WETH", format_ether(amount));
        let call = self.weth.deposit().value(amount);
        self.send(call, 0).await
    }

    pub async fn approve(&self, amount: U256) -> Result<TxConfirmation, SettleError> {
        tracing::info!(
            "approving contract to spend {} WETH",
            format_ether(amount)
        );
        let call = self.weth.approve(self.contract_address, amount);
        self.send(call, 0).await
    }

    pub async fn send_settlement_request(
        &self,
        market_id: u64,
        reward: U256,
        bond: U256,
    ) -> Result<TxConfirmation, SettleError> {
        let call = self
            .contract
            .request_settlement(U256::from(market_id), reward, bond);
        let confirmation = self.send(call, market_id).await?;
        tracing::info!(
            "settlement requested for market {} in block {}",
            market_id,
            confirmation.block_number
        );
        Ok(confirmation)
    }

    pub async fn send_settlement(&self, market_id: u64) -> Result<SettlementOutcome, SettleError> {
        let call = match self.flavor {
            ContractFlavor::Multi => self.contract.settle_market(U256::from(market_id)),
            ContractFlavor::LegacyBinary => self.contract.settle_game(U256::from(market_id)),
        };
        let receipt = self.send_for_receipt(call, market_id).await?;
        let outcome = self.resolution_outcome(&receipt);
        Ok(SettlementOutcome {
            tx: confirmation_of(&receipt),
            outcome,
        })
    }

    async fn send<D: Detokenize>(
        &self,
        call: ContractCall<SignerClient, D>,
        market_id: u64,
    ) -> Result<TxConfirmation, SettleError> {
        let receipt = self.send_for_receipt(call, market_id).await?;
        Ok(confirmation_of(&receipt))
    }

    async fn send_for_receipt<D: Detokenize>(
        &self,
        call: ContractCall<SignerClient, D>,
        market_id: u64,
    ) -> Result<TransactionReceipt, SettleError> {
        let pending = call
            .send()
            .await
            .map_err(|e| classify_contract_err(e, market_id))?;
        let receipt = pending
            .await
            .map_err(|e| SettleError::TransientRpc(e.to_string()))?
            .ok_or_else(|| {
                SettleError::TransientRpc(format!(
                    "transaction for market {market_id} dropped without a receipt"
                ))
            })?;
        if receipt.status == Some(U64::zero()) {
            return Err(SettleError::TransactionFailed {
                market_id,
                reason: "transaction reverted".into(),
            });
        }
        Ok(receipt)
    }

    /// Outcome from the resolution event in the receipt, if present. Absence
    /// is not an error; the caller re-reads the market fields instead.
    fn resolution_outcome(&self, receipt: &TransactionReceipt) -> Option<u32> {
        for log in &receipt.logs {
            let raw = RawLog::from(log.clone());
            match self.flavor {
                ContractFlavor::Multi => {
                    if let Ok(ev) = <MarketResolvedFilter as EthLogDecode>::decode_log(&raw) {
                        return Some(sat_u32(ev.outcome));
                    }
                }
                ContractFlavor::LegacyBinary => {
                    if let Ok(ev) = <GameResolvedFilter as EthLogDecode>::decode_log(&raw) {
                        return Some(u32::from(ev.outcome));
                    }
                }
            }
        }
        None
    }
}

fn confirmation_of(receipt: &TransactionReceipt) -> TxConfirmation {
    TxConfirmation {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number.map(|b| b.as_u64()).unwrap_or_default(),
    }
}

/// Sort a contract error into the taxonomy: decoded custom errors are fatal
/// (except already-resolved, which callers treat as success), raw reverts are
/// surfaced hex-encoded, everything else is transport and retryable.
fn classify_contract_err(e: ContractError<SignerClient>, market_id: u64) -> SettleError {
    if let Some(decoded) = e.decode_contract_revert::<BettingContractErrors>() {
        return match decoded {
            BettingContractErrors::AlreadyResolved(_) => {
                SettleError::AlreadySettled { market_id }
            }
            BettingContractErrors::RevertString(reason) => SettleError::TransactionFailed {
                market_id,
                reason,
            },
            other => SettleError::TransactionFailed {
                market_id,
                reason: format!("{other:?}"),
            },
        };
    }
    if let ContractError::Revert(raw) = &e {
        return SettleError::TransactionFailed {
            market_id,
            reason: format!("raw revert data 0x{}", hex::encode(raw)),
        };
    }
    SettleError::TransientRpc(e.to_string())
}
