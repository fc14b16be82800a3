use chrono::Utc;

use crate::types::{LifecycleState, MarketSnapshot};

/// Map a market snapshot and a point in time onto the settlement lifecycle.
///
/// Resolution dominates everything else, and expiration is checked before the
/// request stamp so a (hypothetically invalid) pre-expiration request still
/// reports ACTIVE instead of masking the anomaly. Ties resolve to the later
/// state: at exactly `expiration_date` the market is expired, at exactly
/// `request_time + verification_time` it is settleable.
pub fn classify(market: &MarketSnapshot, now: u64) -> LifecycleState {
    if market.is_resolved {
        return LifecycleState::Resolved;
    }
    if now < market.expiration_date {
        return LifecycleState::Active;
    }
    if market.request_time == 0 {
        return LifecycleState::ExpiredAwaitingRequest;
    }
    if now < market.request_time.saturating_add(market.verification_time) {
        return LifecycleState::AwaitingLiveness;
    }
    LifecycleState::ReadyToSettle
}

/// Seconds remaining in the liveness window, 0 once it has elapsed.
pub fn liveness_remaining(market: &MarketSnapshot, now: u64) -> u64 {
    market
        .request_time
        .saturating_add(market.verification_time)
        .saturating_sub(now)
}

pub fn unix_now() -> u64 {
    Utc::now().timestamp().max(0) as u64
}
