use std::sync::Arc;

use crate::eth::client::EthGateway;
use crate::ledger::BetLedger;
use crate::settlement::Coordinator;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<EthGateway>,
    pub coordinator: Arc<Coordinator>,
    pub ledger: Arc<BetLedger>,
    /// Platform fee in basis points, applied to payout quotes.
    pub fee_bps: u32,
}
