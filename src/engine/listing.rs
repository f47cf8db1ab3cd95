use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::geo::haversine_km;
use crate::models::driver::Driver;
use crate::models::location::GeoPoint;
use crate::models::order::{DeliveryOrder, OrderStatus};
use crate::models::pool::PoolStatus;
use crate::store::Store;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PoolOrdering {
    /// Trip length, shortest first.
    Distance,
    /// Estimated arrival, soonest first.
    Arrival,
    /// Newest first.
    #[default]
    CreatedAt,
}

impl PoolOrdering {
    /// Unknown values fall back to the default ordering.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("distance") => PoolOrdering::Distance,
            Some("arrival") => PoolOrdering::Arrival,
            _ => PoolOrdering::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalWindow {
    Today,
    Tomorrow,
}

impl ArrivalWindow {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw {
            Some("today") => Some(ArrivalWindow::Today),
            Some("tomorrow") => Some(ArrivalWindow::Tomorrow),
            _ => None,
        }
    }

    /// UTC day slice, `[start, end)`.
    fn bounds(self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
        let start = match self {
            ArrivalWindow::Today => today,
            ArrivalWindow::Tomorrow => today + TimeDelta::days(1),
        };
        (start, start + TimeDelta::days(1))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolListing {
    pub order: DeliveryOrder,
    pub distance_km: f64,
    pub trip_distance_km: f64,
    pub estimated_arrival: DateTime<Utc>,
}

/// The driver's open pool entries in one category.
pub fn driver_pool(
    store: &Store,
    driver: &Driver,
    category_id: Uuid,
    ordering: PoolOrdering,
    window: Option<ArrivalWindow>,
    now: DateTime<Utc>,
) -> Vec<PoolListing> {
    let entries = store
        .pool
        .filter(|entry| entry.driver_id == driver.id && entry.status == PoolStatus::Pending);

    let mut listings: Vec<PoolListing> = entries
        .iter()
        .filter_map(|entry| store.orders.get(&entry.order_id))
        .filter(|order| {
            order.category_id == category_id
                && order.status == OrderStatus::OrderCreated
                && !order.is_assigned()
        })
        .filter_map(|order| {
            let trip_distance_km = store
                .reference
                .locations
                .get(&order.destination_id)
                .map(|destination| haversine_km(&order.pickup, &destination.point))
                .unwrap_or_default();
            let duration_secs = store
                .reference
                .delivery_times
                .get(&order.delivery_time_id)
                .map(|tier| tier.duration_secs)
                .unwrap_or_default();

            let Some(estimated_arrival) = TimeDelta::try_seconds(duration_secs)
                .and_then(|window| now.checked_add_signed(window))
            else {
                warn!(
                    order_id = %order.id,
                    duration_secs,
                    "delivery window out of range; skipping order"
                );
                return None;
            };

            Some(PoolListing {
                distance_km: haversine_km(&driver.location, &order.pickup),
                trip_distance_km,
                estimated_arrival,
                order,
            })
        })
        .collect();

    if let Some(window) = window {
        let (start, end) = window.bounds(now);
        listings.retain(|item| item.estimated_arrival >= start && item.estimated_arrival < end);
    }

    match ordering {
        PoolOrdering::Distance => {
            listings.sort_by(|a, b| a.trip_distance_km.total_cmp(&b.trip_distance_km))
        }
        PoolOrdering::Arrival => listings.sort_by_key(|item| item.estimated_arrival),
        PoolOrdering::CreatedAt => {
            listings.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at))
        }
    }

    listings
}

#[derive(Debug, Clone, Serialize)]
pub struct NearbyDriver {
    #[serde(flatten)]
    pub driver: Driver,
    pub distance_km: f64,
}

/// Drivers within `radius_km` of `point`, nearest first.
pub fn drivers_near(store: &Store, point: &GeoPoint, radius_km: f64) -> Vec<NearbyDriver> {
    let mut nearby: Vec<NearbyDriver> = store
        .drivers
        .all()
        .into_iter()
        .map(|driver| NearbyDriver {
            distance_km: haversine_km(&driver.location, point),
            driver,
        })
        .filter(|item| item.distance_km <= radius_km)
        .collect();
    nearby.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    nearby
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use super::{driver_pool, drivers_near, ArrivalWindow, PoolOrdering};
    use crate::engine::lifecycle::create_order;
    use crate::engine::testing::Fixture;
    use crate::models::location::GeoPoint;
    use crate::models::order::OrderStatus;
    use crate::models::reference::DeliveryTime;

    #[test]
    fn lists_only_open_entries_in_category() {
        let fx = Fixture::new();
        let driver = fx.driver_at(GeoPoint::new(24.71, 46.61), true);
        let sender = fx.user(false);
        let first = fx.order(&sender, GeoPoint::new(24.7, 46.6), "+966566666666");
        let second = fx.order(&sender, GeoPoint::new(24.72, 46.62), "+966566666666");
        fx.state
            .store
            .orders
            .update(&first.id, |o| o.status = OrderStatus::OrderCanceled);

        let now = Utc::now();
        let items = driver_pool(
            &fx.state.store,
            &driver,
            fx.category_id,
            PoolOrdering::default(),
            None,
            now,
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].order.id, second.id);
        assert!(items[0].distance_km < 2.0);
        assert!(items[0].trip_distance_km > 800.0);

        let other = driver_pool(
            &fx.state.store,
            &driver,
            fx.truck_category_id,
            PoolOrdering::default(),
            None,
            now,
        );
        assert!(other.is_empty());
    }

    #[test]
    fn arrival_windows_split_by_utc_day() {
        let fx = Fixture::new();
        let driver = fx.driver_at(GeoPoint::new(24.71, 46.61), true);
        let sender = fx.user(false);
        let same_day = fx.order(&sender, GeoPoint::new(24.7, 46.6), "+966566666666");
        let mut draft = fx.draft(GeoPoint::new(24.7, 46.6), "+966566666666");
        draft.delivery_time_id = fx.next_day_id;
        let next_day =
            crate::engine::lifecycle::create_order(&fx.state, &sender, draft).unwrap();

        let morning = Utc.with_ymd_and_hms(2026, 3, 10, 8, 0, 0).unwrap();
        let list = |window| {
            driver_pool(
                &fx.state.store,
                &driver,
                fx.category_id,
                PoolOrdering::Arrival,
                window,
                morning,
            )
        };

        let today = list(Some(ArrivalWindow::Today));
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].order.id, same_day.id);

        let tomorrow = list(Some(ArrivalWindow::Tomorrow));
        assert_eq!(tomorrow.len(), 1);
        assert_eq!(tomorrow[0].order.id, next_day.id);

        let all = list(None);
        assert_eq!(all[0].order.id, same_day.id);
        assert_eq!(all[1].order.id, next_day.id);
    }

    #[test]
    fn unknown_query_values_fall_back() {
        assert_eq!(PoolOrdering::parse(Some("price")), PoolOrdering::CreatedAt);
        assert_eq!(PoolOrdering::parse(Some("distance")), PoolOrdering::Distance);
        assert_eq!(ArrivalWindow::parse(Some("yesterday")), None);
    }

    #[test]
    fn distance_ordering_puts_shortest_trip_first() {
        let fx = Fixture::new();
        let driver = fx.driver_at(GeoPoint::new(24.71, 46.61), true);
        let sender = fx.user(false);
        let long_haul = fx.order(&sender, GeoPoint::new(24.7, 46.6), "+966566666666");
        let mut draft = fx.draft(GeoPoint::new(24.7, 46.6), "+966566666666");
        draft.destination_id = fx.riyadh_id;
        let local = create_order(&fx.state, &sender, draft).unwrap();

        let items = driver_pool(
            &fx.state.store,
            &driver,
            fx.category_id,
            PoolOrdering::Distance,
            None,
            Utc::now(),
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].order.id, local.id);
        assert_eq!(items[1].order.id, long_haul.id);
        assert!(items[0].trip_distance_km < items[1].trip_distance_km);
    }

    #[test]
    fn default_ordering_is_newest_first() {
        let fx = Fixture::new();
        let driver = fx.driver_at(GeoPoint::new(24.71, 46.61), true);
        let sender = fx.user(false);
        let older = fx.order(&sender, GeoPoint::new(24.7, 46.6), "+966566666666");
        let newer = fx.order(&sender, GeoPoint::new(24.7, 46.6), "+966566666666");
        fx.state
            .store
            .orders
            .update(&older.id, |o| o.created_at = Utc::now() - Duration::hours(2));

        let items = driver_pool(
            &fx.state.store,
            &driver,
            fx.category_id,
            PoolOrdering::parse(None),
            None,
            Utc::now(),
        );
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].order.id, newer.id);
        assert_eq!(items[1].order.id, older.id);
    }

    #[test]
    fn unrepresentable_delivery_window_is_skipped() {
        let fx = Fixture::new();
        let driver = fx.driver_at(GeoPoint::new(24.71, 46.61), true);
        let sender = fx.user(false);
        let regular = fx.order(&sender, GeoPoint::new(24.7, 46.6), "+966566666666");

        let forever = DeliveryTime {
            id: Uuid::new_v4(),
            name: "Forever".to_string(),
            duration_secs: i64::MAX,
        };
        let forever_id = forever.id;
        fx.state.store.reference.delivery_times.upsert(forever);
        let mut draft = fx.draft(GeoPoint::new(24.7, 46.6), "+966566666666");
        draft.delivery_time_id = forever_id;
        create_order(&fx.state, &sender, draft).unwrap();

        let items = driver_pool(
            &fx.state.store,
            &driver,
            fx.category_id,
            PoolOrdering::Arrival,
            None,
            Utc::now(),
        );
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].order.id, regular.id);
    }

    #[test]
    fn nearby_drivers_are_sorted_and_bounded() {
        let fx = Fixture::new();
        let far = fx.driver_at(GeoPoint::new(24.9, 46.7), false);
        let near = fx.driver_at(GeoPoint::new(24.72, 46.68), true);
        fx.driver_at(GeoPoint::new(21.5, 39.2), true);

        let found = drivers_near(&fx.state.store, &GeoPoint::new(24.7136, 46.6753), 50.0);
        let ids: Vec<_> = found.iter().map(|item| item.driver.id).collect();
        assert_eq!(ids, vec![near.id, far.id]);
        assert!(found[0].distance_km < found[1].distance_km);
    }
}
