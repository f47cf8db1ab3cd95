//! Builds pool entries between orders awaiting a driver and nearby
//! available drivers. Runs after the order or driver write has committed;
//! a failed row never fails the triggering request.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::geo::haversine_km;
use crate::models::driver::Driver;
use crate::models::event::DispatchEvent;
use crate::models::order::{DeliveryOrder, OrderStatus};
use crate::models::pool::PoolEntry;
use crate::state::AppState;

pub fn on_order_created(state: &AppState, order: &DeliveryOrder) -> usize {
    if order.status != OrderStatus::OrderCreated || order.is_assigned() {
        return 0;
    }

    let radius_km = state.dispatch.eligibility_radius_km;
    let mut candidates: Vec<(Driver, f64)> = state
        .store
        .drivers
        .all()
        .into_iter()
        .map(|driver| {
            let distance_km = haversine_km(&driver.location, &order.pickup);
            (driver, distance_km)
        })
        .filter(|(_, distance_km)| *distance_km <= radius_km)
        .collect();
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

    let created = candidates
        .iter()
        .filter(|(driver, _)| driver_is_available(state, driver))
        .filter(|(driver, distance_km)| open_entry(state, order.id, driver.id, *distance_km))
        .count();

    info!(
        order_id = %order.id,
        candidates = candidates.len(),
        created,
        "order pool populated"
    );
    created
}

pub fn on_driver_created(state: &AppState, driver: &Driver) -> usize {
    if !driver_is_available(state, driver) {
        return 0;
    }

    let radius_km = state.dispatch.eligibility_radius_km;
    let mut candidates: Vec<(Uuid, f64)> = state
        .store
        .orders
        .filter(|order| order.status == OrderStatus::OrderCreated && !order.is_assigned())
        .into_iter()
        .map(|order| (order.id, haversine_km(&driver.location, &order.pickup)))
        .filter(|(_, distance_km)| *distance_km <= radius_km)
        .collect();
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));

    let created = candidates
        .iter()
        .filter(|(order_id, distance_km)| open_entry(state, *order_id, driver.id, *distance_km))
        .count();

    info!(
        driver_id = %driver.id,
        candidates = candidates.len(),
        created,
        "driver pool populated"
    );
    created
}

/// Unset availability counts as unavailable.
fn driver_is_available(state: &AppState, driver: &Driver) -> bool {
    match state.store.users.get(&driver.user_id) {
        Some(user) => {
            if user.settings.is_available.is_none() {
                debug!(driver_id = %driver.id, "availability not set, skipping driver");
            }
            user.settings.is_available()
        }
        None => {
            warn!(driver_id = %driver.id, user_id = %driver.user_id, "driver without user record");
            false
        }
    }
}

fn open_entry(state: &AppState, order_id: Uuid, driver_id: Uuid, distance_km: f64) -> bool {
    match state.store.pool.insert_new(PoolEntry::pending(order_id, driver_id)) {
        Ok(()) => {
            state.metrics.pool_entries_created_total.inc();
            state.publish(DispatchEvent::PoolEntryCreated {
                order_id,
                driver_id,
                distance_km,
            });
            true
        }
        Err(_) => {
            warn!(order_id = %order_id, driver_id = %driver_id, "pool entry already exists");
            false
        }
    }
}
