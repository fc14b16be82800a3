pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod odds;
pub mod routes;
pub mod settlement;
pub mod state;
pub mod types;

pub mod eth;
pub mod worker;

#[cfg(test)]
pub(crate) mod testutil;

// Optional: expose a router builder so main.rs can be tiny
use axum::Router;
use state::AppState;

pub fn app(state: AppState) -> Router {
    routes::router(state)
}
