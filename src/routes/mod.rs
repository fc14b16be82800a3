use axum::http::StatusCode;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::error::SettleError;
use crate::state::AppState;

pub mod bets;
pub mod market;
pub mod settlement;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/markets", get(market::list_markets))
        .route("/markets/:id", get(market::get_market))
        .route("/markets/:id/quote", get(market::quote_payout))
        .route("/bets/:address", get(bets::get_user_bets))
        .route("/settlements/sweep", post(settlement::run_sweep))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

pub(crate) fn error_response(e: SettleError) -> (StatusCode, String) {
    let status = match &e {
        SettleError::Validation { .. } => StatusCode::BAD_REQUEST,
        SettleError::TransientRpc(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}
