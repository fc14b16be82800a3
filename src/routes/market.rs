use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use ethers::types::U256;
use ethers::utils::format_ether;
use serde::{Deserialize, Serialize};

use crate::lifecycle::{classify, unix_now};
use crate::odds::{net_stake, percentages, projected_payout};
use crate::routes::error_response;
use crate::state::AppState;
use crate::types::{LifecycleState, MarketSnapshot};

#[derive(Serialize)]
pub struct MarketSummary {
    pub id: u64,
    pub description: String,
    pub status: LifecycleState,
    pub percentages: Vec<u64>,
    pub option_amounts: Vec<String>,
    pub total_pool: String,
    pub expiration_date: u64,
    pub outcome: Option<u32>,
    pub category: u8,
    pub image_url: String,
}

fn summarize(market: &MarketSnapshot, now: u64) -> MarketSummary {
    MarketSummary {
        id: market.market_id,
        description: market.description.clone(),
        status: classify(market, now),
        percentages: percentages(&market.option_amounts),
        option_amounts: market
            .option_amounts
            .iter()
            .map(|a| format_ether(*a))
            .collect(),
        total_pool: format_ether(market.total_pool()),
        expiration_date: market.expiration_date,
        outcome: market.outcome,
        category: market.category,
        image_url: market.image_url.clone(),
    }
}

pub async fn list_markets(
    State(state): State<AppState>,
) -> Result<Json<Vec<MarketSummary>>, (StatusCode, String)> {
    let markets = state.gateway.fetch_all().await.map_err(error_response)?;
    let now = unix_now();
    Ok(Json(markets.iter().map(|m| summarize(m, now)).collect()))
}

pub async fn get_market(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<MarketSummary>, (StatusCode, String)> {
    let market = state.gateway.fetch_by_id(id).await.map_err(error_response)?;
    Ok(Json(summarize(&market, unix_now())))
}

#[derive(Deserialize)]
pub struct QuoteParams {
    pub option: usize,
    /// Stake in wei, decimal string.
    pub amount: String,
}

#[derive(Serialize)]
pub struct QuoteView {
    pub market_id: u64,
    pub option: usize,
    pub stake: String,
    pub net_stake: String,
    pub projected_payout: String,
}

pub async fn quote_payout(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<QuoteView>, (StatusCode, String)> {
    let amount = U256::from_dec_str(&params.amount)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("bad amount: {e}")))?;

    let market = state.gateway.fetch_by_id(id).await.map_err(error_response)?;
    if classify(&market, unix_now()) != LifecycleState::Active {
        return Err((
            StatusCode::BAD_REQUEST,
            "market is not open for betting".to_string(),
        ));
    }
    if params.option >= market.option_amounts.len() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("market has no option {}", params.option),
        ));
    }

    let payout = projected_payout(&market.option_amounts, params.option, amount, state.fee_bps);
    Ok(Json(QuoteView {
        market_id: id,
        option: params.option,
        stake: format_ether(amount),
        net_stake: format_ether(net_stake(amount, state.fee_bps)),
        projected_payout: format_ether(payout),
    }))
}
