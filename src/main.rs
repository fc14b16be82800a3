use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use betsettle_backend::eth::client::{EthConfig, EthGateway};
use betsettle_backend::ledger::BetLedger;
use betsettle_backend::settlement::{Coordinator, SweepConfig, TieredEscrow};
use betsettle_backend::state::AppState;
use betsettle_backend::worker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // Load env
    dotenvy::dotenv().ok();

    let config = EthConfig::from_env()?;
    let gateway = Arc::new(EthGateway::connect(&config)?);

    let coordinator = Arc::new(Coordinator::new(
        gateway.clone(),
        Box::new(TieredEscrow::default()),
        SweepConfig {
            settle_delay: Duration::from_secs(env_u64("SETTLE_DELAY_SECS", 5)),
        },
    ));
    let ledger = Arc::new(BetLedger::new(
        gateway.clone(),
        env_u64("LOOKBACK_BLOCKS", 10_000),
    ));

    let state = AppState {
        gateway,
        coordinator,
        ledger,
        fee_bps: env_u64("FEE_BPS", 300) as u32,
    };

    let sweep_state = state.clone();
    let sweep_interval = Duration::from_secs(env_u64("SWEEP_INTERVAL_SECS", 300));
    tokio::spawn(async move {
        worker::sweep_loop(sweep_state, sweep_interval).await;
    });

    let app = betsettle_backend::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], env_u64("PORT", 3000) as u16));
    tracing::info!("Server running on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
