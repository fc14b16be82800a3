use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::routes::error_response;
use crate::state::AppState;
use crate::types::SweepReport;

/// Manual trigger for the same sweep the background worker runs.
pub async fn run_sweep(
    State(state): State<AppState>,
) -> Result<Json<SweepReport>, (StatusCode, String)> {
    let report = state.coordinator.run_sweep().await.map_err(error_response)?;
    Ok(Json(report))
}
