use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use crate::models::order::OrderStatus;
use crate::models::pool::PoolStatus;
use crate::state::AppState;

/// Expires pending pool entries that outlived the TTL or whose order no
/// longer waits for a driver. Returns how many were expired.
pub async fn expire_stale_entries(state: &AppState, now: DateTime<Utc>) -> usize {
    // An unrepresentable TTL disables age-based expiry; closed orders still expire.
    let ttl = TimeDelta::try_seconds(state.dispatch.pool_entry_ttl_secs);
    if ttl.is_none() {
        warn!(
            ttl_secs = state.dispatch.pool_entry_ttl_secs,
            "pool entry ttl out of range; skipping age check"
        );
    }
    let pending = state
        .store
        .pool
        .keys_where(|entry| entry.status == PoolStatus::Pending);

    let mut expired = 0;
    for key in pending {
        let _order_guard = state.locks.order(key.0).await;

        let order_open = state
            .store
            .orders
            .get(&key.0)
            .is_some_and(|order| order.status == OrderStatus::OrderCreated && !order.is_assigned());

        let changed = state
            .store
            .pool
            .update(&key, |entry| {
                let stale = ttl
                    .and_then(|ttl| entry.created_at.checked_add_signed(ttl))
                    .is_some_and(|deadline| deadline <= now);
                (stale || !order_open) && entry.resolve(PoolStatus::Expired)
            })
            .unwrap_or(false);
        if changed {
            expired += 1;
        }
    }

    if expired > 0 {
        state
            .metrics
            .pool_entries_expired_total
            .inc_by(expired as u64);
    }
    expired
}

pub async fn run_pool_expiry(state: Arc<AppState>) {
    let every = state.dispatch.expiry_sweep_interval_secs;
    if every == 0 {
        info!("pool expiry sweep disabled");
        return;
    }

    info!(interval_secs = every, "pool expiry sweep started");
    let mut ticker = tokio::time::interval(StdDuration::from_secs(every));
    loop {
        ticker.tick().await;
        let expired = expire_stale_entries(&state, Utc::now()).await;
        if expired > 0 {
            info!(expired, "expired stale pool entries");
        } else {
            debug!("no stale pool entries");
        }
    }
}
