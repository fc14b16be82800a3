use std::time::Duration;

use crate::state::AppState;
use crate::types::SweepAction;

/// Background sweep: classify and advance every market on a fixed interval.
/// Transient failures are logged and retried on the next tick.
pub async fn sweep_loop(state: AppState, interval: Duration) {
    loop {
        match state.coordinator.run_sweep().await {
            Ok(report) => {
                let actions = report
                    .entries
                    .iter()
                    .filter(|e| !matches!(e.action, SweepAction::None))
                    .count();
                let errors = report.entries.iter().filter(|e| e.error.is_some()).count();
                tracing::info!(
                    "sweep {} done: {} markets scanned, {} actions, {} errors",
                    report.run_id,
                    report.scanned,
                    actions,
                    errors
                );
            }
            Err(e) => {
                tracing::error!("sweep failed: {e}");
            }
        }

        tokio::time::sleep(interval).await;
    }
}
