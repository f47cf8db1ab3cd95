//! Read-time aggregates for a user, computed only when asked for.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::offer::OfferStatus;
use crate::models::rating::Rating;
use crate::store::Store;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct UserStats {
    pub is_driver: bool,
    pub purchases_count: usize,
    pub orders_count: usize,
    pub in_progress_orders_count: usize,
    pub trips_count: usize,
    pub balances_sum_balance: f64,
    pub monthly_revenue: f64,
    pub fast_ratings_avg_score: f64,
    pub experience_ratings_avg_score: f64,
    pub recommended_ratings_avg_score: f64,
    pub ratings_avg_score: f64,
    pub reviews_count: usize,
}

pub fn user_stats(store: &Store, user_id: Uuid, now: DateTime<Utc>) -> UserStats {
    let purchases_count = store.orders.count(|order| order.sender_id == user_id);

    let Some(driver) = store.driver_for_user(user_id) else {
        return UserStats {
            purchases_count,
            ..UserStats::default()
        };
    };

    let driven = store
        .orders
        .filter(|order| order.driver_id == Some(driver.id));
    let pending_offers = store.offers.count(|offer| {
        offer.driver_id == driver.id && offer.status == OfferStatus::Pending
    });
    let active_orders = driven
        .iter()
        .filter(|order| !order.status.is_terminal())
        .count();
    let trips_count = driven
        .iter()
        .filter(|order| order.status.is_trip_done())
        .count();

    let balances = store
        .balances
        .filter(|balance| balance.driver_id == driver.id);
    let balances_sum_balance = balances.iter().map(|b| b.balance).sum();
    let monthly_revenue = balances
        .iter()
        .filter(|b| b.created_at.year() == now.year() && b.created_at.month() == now.month())
        .map(|b| b.balance)
        .sum();

    let ratings: Vec<Rating> = driven
        .iter()
        .filter_map(|order| store.ratings.get(&order.id))
        .collect();
    let averages: Vec<Option<f64>> = (0..3)
        .map(|i| mean(ratings.iter().filter_map(|rating| rating.scores()[i])))
        .collect();
    let ratings_avg_score = match averages.as_slice() {
        [Some(fast), Some(experience), Some(recommended)] => {
            round_score((fast + experience + recommended) / 3.0)
        }
        _ => 0.0,
    };
    let score = |i: usize| averages[i].map(round_score).unwrap_or_default();

    UserStats {
        is_driver: true,
        purchases_count,
        orders_count: driven.len(),
        in_progress_orders_count: pending_offers + active_orders,
        trips_count,
        balances_sum_balance,
        monthly_revenue,
        fast_ratings_avg_score: score(0),
        experience_ratings_avg_score: score(1),
        recommended_ratings_avg_score: score(2),
        ratings_avg_score,
        reviews_count: ratings.len(),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// One decimal, inside `[0, 5]`.
fn round_score(value: f64) -> f64 {
    ((value * 10.0).round() / 10.0).clamp(0.0, 5.0)
}
