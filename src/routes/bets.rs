use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use ethers::types::Address;

use crate::routes::error_response;
use crate::state::AppState;
use crate::types::BetHistory;

pub async fn get_user_bets(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<BetHistory>, (StatusCode, String)> {
    let bettor: Address = address
        .parse()
        .map_err(|_| (StatusCode::BAD_REQUEST, "invalid address".to_string()))?;

    let history = state
        .ledger
        .user_bet_history(bettor)
        .await
        .map_err(error_response)?;
    Ok(Json(history))
}
