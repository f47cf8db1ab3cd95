use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// What a driver is committed to right now.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Commitments {
    pub pending_offers: usize,
    pub active_orders: usize,
    pub ceiling: i64,
}

impl Commitments {
    pub fn total(&self) -> i64 {
        (self.pending_offers + self.active_orders) as i64
    }

    pub fn has_room(&self) -> bool {
        self.total() < self.ceiling
    }
}

pub fn commitments(state: &AppState, driver_id: Uuid) -> Result<Commitments, AppError> {
    Ok(Commitments {
        pending_offers: state.store.pending_offer_count(driver_id),
        active_orders: state.store.active_order_count(driver_id),
        ceiling: state.settings.max_orders_per_trip()?,
    })
}

/// Callers hold the driver lock so the count cannot move under them.
pub fn ensure_capacity(state: &AppState, driver_id: Uuid) -> Result<Commitments, AppError> {
    let current = commitments(state, driver_id)?;
    if !current.has_room() {
        state.metrics.capacity_rejections_total.inc();
        warn!(
            driver_id = %driver_id,
            pending_offers = current.pending_offers,
            active_orders = current.active_orders,
            ceiling = current.ceiling,
            "driver at capacity"
        );
        return Err(AppError::CapacityExceeded {
            limit: current.ceiling,
        });
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::ensure_capacity;
    use crate::engine::testing::Fixture;
    use crate::error::AppError;
    use crate::models::location::GeoPoint;
    use crate::models::offer::{Offer, OfferStatus};
    use crate::models::order::OrderStatus;
    use crate::services::settings::MAX_ORDERS_PER_TRIP;

    fn commit(fx: &Fixture, driver_id: Uuid, active: usize, pending: usize) {
        let sender = fx.user(false);
        for _ in 0..active {
            let order = fx.order(&sender, GeoPoint::new(24.7, 46.6), "+966533333333");
            fx.state.store.orders.update(&order.id, |order| {
                order.driver_id = Some(driver_id);
                order.status = OrderStatus::InTransit;
            });
        }
        for _ in 0..pending {
            let order = fx.order(&sender, GeoPoint::new(24.7, 46.6), "+966533333333");
            fx.state.store.offers.upsert(Offer {
                id: Uuid::new_v4(),
                order_id: order.id,
                driver_id,
                amount: 10.0,
                status: OfferStatus::Pending,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
        }
    }

    #[test]
    fn ceiling_itself_is_rejected() {
        let fx = Fixture::new();
        let driver = fx.driver_at(GeoPoint::new(24.7, 46.6), true);
        commit(&fx, driver.id, 3, 2);

        let err = ensure_capacity(&fx.state, driver.id).unwrap_err();
        assert!(matches!(err, AppError::CapacityExceeded { limit: 5 }));
        assert_eq!(fx.state.metrics.capacity_rejections_total.get(), 1);
    }

    #[test]
    fn one_below_ceiling_is_accepted() {
        let fx = Fixture::new();
        let driver = fx.driver_at(GeoPoint::new(24.7, 46.6), true);
        commit(&fx, driver.id, 2, 2);

        let current = ensure_capacity(&fx.state, driver.id).unwrap();
        assert_eq!(current.total(), 4);
    }

    #[test]
    fn terminal_orders_do_not_count() {
        let fx = Fixture::new();
        let driver = fx.driver_at(GeoPoint::new(24.7, 46.6), true);
        commit(&fx, driver.id, 5, 0);
        for id in fx.state.store.orders.keys_where(|o| o.driver_id == Some(driver.id)) {
            fx.state
                .store
                .orders
                .update(&id, |order| order.status = OrderStatus::OrderCompleted);
        }

        assert!(ensure_capacity(&fx.state, driver.id).is_ok());
    }

    #[test]
    fn unreadable_ceiling_is_internal() {
        let fx = Fixture::new();
        let driver = fx.driver_at(GeoPoint::new(24.7, 46.6), true);
        fx.state.settings.set(MAX_ORDERS_PER_TRIP, "many");

        let err = ensure_capacity(&fx.state, driver.id).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
