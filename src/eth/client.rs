// src/eth/client.rs

use ethers::core::k256::ecdsa::SigningKey;
use ethers::prelude::*;
use std::sync::Arc;

use super::{BettingContract, Weth};
use crate::error::SettleError;

pub type SignerClient = SignerMiddleware<Provider<Http>, Wallet<SigningKey>>;

/// Which generation of the betting contract we are talking to. The legacy
/// binary ABI (`games`/`settleGame`, Yes/No pools) is adapted into the same
/// snapshot shape at the read boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractFlavor {
    Multi,
    LegacyBinary,
}

#[derive(Debug, Clone)]
pub struct EthConfig {
    pub rpc_url: String,
    pub private_key: String,
    pub contract_address: Address,
    pub weth_address: Address,
    pub chain_id: u64,
    pub flavor: ContractFlavor,
}

impl EthConfig {
    pub fn from_env() -> Result<Self, SettleError> {
        let rpc_url = required("RPC_URL")?;
        let private_key = required("PRIVATE_KEY")?;
        let contract_address = required("CONTRACT_ADDRESS")?
            .parse()
            .map_err(|_| SettleError::Configuration("CONTRACT_ADDRESS is not a valid address".into()))?;
        let weth_address = required("WETH_ADDRESS")?
            .parse()
            .map_err(|_| SettleError::Configuration("WETH_ADDRESS is not a valid address".into()))?;
        let chain_id = required("CHAIN_ID")?
            .parse()
            .map_err(|_| SettleError::Configuration("CHAIN_ID is not a number".into()))?;
        let flavor = match std::env::var("CONTRACT_FLAVOR").ok().as_deref() {
            Some("legacy") => ContractFlavor::LegacyBinary,
            _ => ContractFlavor::Multi,
        };

        Ok(Self {
            rpc_url,
            private_key,
            contract_address,
            weth_address,
            chain_id,
            flavor,
        })
    }
}

fn required(name: &str) -> Result<String, SettleError> {
    std::env::var(name).map_err(|_| SettleError::Configuration(format!("{name} must be set")))
}

pub struct EthGateway {
    pub(crate) client: Arc<SignerClient>,
    pub(crate) contract: BettingContract<SignerClient>,
    pub(crate) weth: Weth<SignerClient>,
    pub(crate) contract_address: Address,
    pub(crate) operator: Address,
    pub(crate) flavor: ContractFlavor,
}

impl EthGateway {
    pub fn connect(config: &EthConfig) -> Result<Self, SettleError> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| SettleError::Configuration(format!("bad RPC_URL: {e}")))?;

        let wallet: LocalWallet = config
            .private_key
            .parse()
            .map_err(|_| SettleError::Configuration("PRIVATE_KEY is not a valid key".into()))?;
        let wallet = wallet.with_chain_id(config.chain_id);
        let operator = wallet.address();

        let client = Arc::new(SignerMiddleware::new(provider, wallet));
        let contract = BettingContract::new(config.contract_address, client.clone());
        let weth = Weth::new(config.weth_address, client.clone());

        Ok(Self {
            client,
            contract,
            weth,
            contract_address: config.contract_address,
            operator,
            flavor: config.flavor,
        })
    }
}
