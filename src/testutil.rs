use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};
use ethers::utils::{format_ether, parse_ether};

use crate::error::SettleError;
use crate::lifecycle::unix_now;
use crate::settlement::ChainGateway;
use crate::types::{BetEvent, MarketSnapshot, SettlementOutcome, TxConfirmation};

/// In-memory stand-in for the chain used by coordinator and ledger tests.
pub(crate) struct MockGateway {
    markets: Mutex<BTreeMap<u64, MarketSnapshot>>,
    escrow_balance: Mutex<U256>,
    native_balance: Mutex<U256>,
    winning: Mutex<HashMap<u64, u32>>,
    events: Mutex<Vec<BetEvent>>,
    latest_block: Mutex<u64>,
    calls: Mutex<Vec<String>>,
    freeze_request_time: AtomicBool,
    suppress_event: AtomicBool,
    revert_already_resolved: AtomicBool,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self {
            markets: Mutex::new(BTreeMap::new()),
            escrow_balance: Mutex::new(U256::zero()),
            native_balance: Mutex::new(U256::zero()),
            winning: Mutex::new(HashMap::new()),
            events: Mutex::new(Vec::new()),
            latest_block: Mutex::new(20_000),
            calls: Mutex::new(Vec::new()),
            freeze_request_time: AtomicBool::new(false),
            suppress_event: AtomicBool::new(false),
            revert_already_resolved: AtomicBool::new(false),
        }
    }
}

impl MockGateway {
    pub fn insert_market(&self, market: MarketSnapshot) {
        self.markets.lock().unwrap().insert(market.market_id, market);
    }

    pub fn get_market(&self, market_id: u64) -> MarketSnapshot {
        self.markets.lock().unwrap()[&market_id].clone()
    }

    pub fn set_escrow_balance(&self, amount: U256) {
        *self.escrow_balance.lock().unwrap() = amount;
    }

    pub fn set_native_balance(&self, amount: U256) {
        *self.native_balance.lock().unwrap() = amount;
    }

    pub fn set_winning_option(&self, market_id: u64, option: u32) {
        self.winning.lock().unwrap().insert(market_id, option);
    }

    pub fn add_bet_event(&self, event: BetEvent) {
        self.events.lock().unwrap().push(event);
    }

    pub fn set_latest_block(&self, block: u64) {
        *self.latest_block.lock().unwrap() = block;
    }

    pub fn freeze_request_time(&self) {
        self.freeze_request_time.store(true, Ordering::SeqCst);
    }

    pub fn suppress_resolution_event(&self) {
        self.suppress_event.store(true, Ordering::SeqCst);
    }

    pub fn revert_settle_as_already_resolved(&self) {
        self.revert_already_resolved.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn confirmation() -> TxConfirmation {
        TxConfirmation {
            tx_hash: H256::repeat_byte(0xab),
            block_number: 1,
        }
    }
}

#[async_trait]
impl ChainGateway for MockGateway {
    async fn fetch_all_markets(&self) -> Result<Vec<MarketSnapshot>, SettleError> {
        Ok(self.markets.lock().unwrap().values().cloned().collect())
    }

    async fn fetch_market(&self, market_id: u64) -> Result<MarketSnapshot, SettleError> {
        self.markets
            .lock()
            .unwrap()
            .get(&market_id)
            .cloned()
            .ok_or_else(|| SettleError::TransientRpc(format!("unknown market {market_id}")))
    }

    async fn latest_block(&self) -> Result<u64, SettleError> {
        Ok(*self.latest_block.lock().unwrap())
    }

    async fn bet_events(
        &self,
        bettor: Address,
        _from_block: u64,
        _to_block: u64,
    ) -> Result<Vec<BetEvent>, SettleError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.bettor == bettor)
            .cloned()
            .collect())
    }

    async fn escrow_balance(&self) -> Result<U256, SettleError> {
        Ok(*self.escrow_balance.lock().unwrap())
    }

    async fn native_balance(&self) -> Result<U256, SettleError> {
        Ok(*self.native_balance.lock().unwrap())
    }

    async fn wrap_native(&self, amount: U256) -> Result<TxConfirmation, SettleError> {
        self.record(format!("wrap({})", fmt_eth(amount)));
        *self.native_balance.lock().unwrap() -= amount;
        *self.escrow_balance.lock().unwrap() += amount;
        Ok(Self::confirmation())
    }

    async fn approve_escrow(&self, amount: U256) -> Result<TxConfirmation, SettleError> {
        self.record(format!("approve({})", fmt_eth(amount)));
        Ok(Self::confirmation())
    }

    async fn request_settlement(
        &self,
        market_id: u64,
        _reward: U256,
        _bond: U256,
    ) -> Result<TxConfirmation, SettleError> {
        self.record(format!("request({market_id})"));
        if !self.freeze_request_time.load(Ordering::SeqCst) {
            if let Some(m) = self.markets.lock().unwrap().get_mut(&market_id) {
                m.request_time = unix_now();
            }
        }
        Ok(Self::confirmation())
    }

    async fn settle_market(&self, market_id: u64) -> Result<SettlementOutcome, SettleError> {
        self.record(format!("settle({market_id})"));
        let outcome = self
            .winning
            .lock()
            .unwrap()
            .get(&market_id)
            .copied()
            .unwrap_or(0);
        if let Some(m) = self.markets.lock().unwrap().get_mut(&market_id) {
            m.is_resolved = true;
            m.outcome = Some(outcome);
        }
        if self.revert_already_resolved.load(Ordering::SeqCst) {
            return Err(SettleError::AlreadySettled { market_id });
        }
        Ok(SettlementOutcome {
            tx: Self::confirmation(),
            outcome: if self.suppress_event.load(Ordering::SeqCst) {
                None
            } else {
                Some(outcome)
            },
        })
    }
}

pub(crate) fn market_with(
    market_id: u64,
    expiration_date: u64,
    request_time: u64,
    verification_time: u64,
    is_resolved: bool,
    pools_eth: &[&str],
) -> MarketSnapshot {
    let option_amounts: Vec<U256> = pools_eth
        .iter()
        .map(|p| parse_ether(*p).unwrap())
        .collect();
    MarketSnapshot {
        market_id,
        description: format!("market {market_id}"),
        creator: Address::zero(),
        expiration_date,
        verification_time,
        is_resolved,
        option_amounts: option_amounts.clone(),
        request_time,
        outcome: is_resolved.then_some(0),
        category: 0,
        image_url: String::new(),
        option_count: option_amounts.len() as u32,
    }
}

fn fmt_eth(amount: U256) -> String {
    let s = format_ether(amount);
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".into()
    } else {
        trimmed.to_string()
    }
}
