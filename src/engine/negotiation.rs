//! Pool entry acceptance, offers and the offer acceptance cascade.

use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::{capacity, chat_best_effort, record_transition};
use crate::error::AppError;
use crate::geo::haversine_km;
use crate::models::driver::Driver;
use crate::models::event::DispatchEvent;
use crate::models::offer::{Offer, OfferStatus};
use crate::models::order::{DeliveryOrder, OrderStatus};
use crate::models::pool::{PoolEntry, PoolStatus};
use crate::models::user::User;
use crate::services::chat::{ChannelId, MemberId};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
pub struct PoolAcceptance {
    pub order: DeliveryOrder,
    pub offer: Offer,
}

#[derive(Debug, Clone, Serialize)]
pub struct OfferAcceptance {
    pub offer: Offer,
    pub order: DeliveryOrder,
    pub declined_offer_ids: Vec<Uuid>,
}

/// Driver side: turns a pending pool entry into a priced offer.
pub async fn accept_pool_entry(
    state: &AppState,
    driver: &Driver,
    order_id: Uuid,
    amount: f64,
) -> Result<PoolAcceptance, AppError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::Unprocessable(
            "amount must be a positive number".to_string(),
        ));
    }
    let started = Instant::now();

    let _driver_guard = state.locks.driver(driver.id).await;
    let _order_guard = state.locks.order(order_id).await;

    let order = state.store.order_or_not_found(order_id)?;
    let entry = pool_entry(state, order_id, driver.id)?;
    if order.status != OrderStatus::OrderCreated || order.is_assigned() {
        return Err(already_assigned());
    }

    capacity::ensure_capacity(state, driver.id)?;

    let current = state
        .store
        .drivers
        .get(&driver.id)
        .ok_or_else(|| AppError::NotFound("driver not found".to_string()))?;
    let distance_km = haversine_km(&current.location, &order.pickup);
    if distance_km > state.dispatch.acceptance_radius_km {
        warn!(
            driver_id = %driver.id,
            order_id = %order_id,
            distance_km,
            "driver too far from pickup"
        );
        return Err(AppError::OutOfRange { distance_km });
    }

    let resolved = state
        .store
        .pool
        .update(&(entry.order_id, entry.driver_id), |row| {
            row.resolve(PoolStatus::Accepted)
        })
        .unwrap_or(false);
    if !resolved {
        return Err(pool_entry_closed(PoolStatus::Expired));
    }

    let now = Utc::now();
    let offer = Offer {
        id: Uuid::new_v4(),
        order_id,
        driver_id: driver.id,
        amount,
        status: OfferStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    state.store.offers.upsert(offer.clone());

    state
        .metrics
        .offers_total
        .with_label_values(&["created"])
        .inc();
    state
        .metrics
        .negotiation_latency_seconds
        .with_label_values(&["accept_pool_entry"])
        .observe(started.elapsed().as_secs_f64());
    state.publish(DispatchEvent::OfferCreated {
        offer_id: offer.id,
        order_id,
        driver_id: driver.id,
        amount,
    });
    info!(offer_id = %offer.id, order_id = %order_id, driver_id = %driver.id, amount, "offer created");

    Ok(PoolAcceptance { order, offer })
}

pub async fn decline_pool_entry(
    state: &AppState,
    driver: &Driver,
    order_id: Uuid,
) -> Result<PoolEntry, AppError> {
    let _order_guard = state.locks.order(order_id).await;

    state.store.order_or_not_found(order_id)?;
    pool_entry(state, order_id, driver.id)?;

    let key = (order_id, driver.id);
    state.store.pool.update(&key, |row| row.resolve(PoolStatus::Rejected));
    info!(order_id = %order_id, driver_id = %driver.id, "pool entry rejected");

    state
        .store
        .pool
        .get(&key)
        .ok_or_else(|| AppError::NotFound("order driver pool not found".to_string()))
}

/// Sender side: picks the winning offer. Offer, order and sibling offers
/// change together under the order lock; chat follows the commit.
pub async fn accept_offer(
    state: &AppState,
    sender: &User,
    offer_id: Uuid,
) -> Result<OfferAcceptance, AppError> {
    let started = Instant::now();
    let order_id = state
        .store
        .offers
        .get(&offer_id)
        .map(|offer| offer.order_id)
        .ok_or_else(offer_not_found)?;

    let (acceptance, driver) = {
        let _order_guard = state.locks.order(order_id).await;

        let (offer, order) = owned_offer(state, sender, offer_id)?;
        if order.status != OrderStatus::OrderCreated || order.is_assigned() {
            return Err(already_assigned());
        }
        if offer.status != OfferStatus::Pending {
            return Err(offer_closed(offer.status));
        }
        let driver = state
            .store
            .drivers
            .get(&offer.driver_id)
            .ok_or_else(|| AppError::NotFound("driver not found".to_string()))?;
        let recipient_id = order.recipient_id.or_else(|| {
            state
                .store
                .user_by_phone(&order.recipient_phone_number)
                .map(|user| user.id)
        });

        let now = Utc::now();
        state.store.offers.update(&offer_id, |row| {
            row.status = OfferStatus::Accepted;
            row.updated_at = now;
        });
        state.store.orders.update(&order_id, |row| {
            row.driver_id = Some(offer.driver_id);
            row.amount = Some(offer.amount);
            row.status = OrderStatus::OrderAccepted;
            row.recipient_id = recipient_id;
            row.updated_at = now;
        });

        let siblings = state.store.offers.keys_where(|row| {
            row.order_id == order_id && row.id != offer_id && row.status == OfferStatus::Pending
        });
        let declined_offer_ids: Vec<Uuid> = siblings
            .into_iter()
            .filter(|id| {
                state
                    .store
                    .offers
                    .update(id, |row| {
                        let pending = row.status == OfferStatus::Pending;
                        if pending {
                            row.status = OfferStatus::Declined;
                            row.updated_at = now;
                        }
                        pending
                    })
                    .unwrap_or(false)
            })
            .collect();

        let offer = state.store.offers.get(&offer_id).ok_or_else(offer_not_found)?;
        let order = state.store.order_or_not_found(order_id)?;
        (
            OfferAcceptance {
                offer,
                order,
                declined_offer_ids,
            },
            driver,
        )
    };

    open_order_chat(state, &acceptance.order, &driver);

    let metrics = &state.metrics;
    metrics.offers_total.with_label_values(&["accepted"]).inc();
    metrics
        .offers_total
        .with_label_values(&["declined"])
        .inc_by(acceptance.declined_offer_ids.len() as u64);
    metrics
        .negotiation_latency_seconds
        .with_label_values(&["accept_offer"])
        .observe(started.elapsed().as_secs_f64());
    state.publish(DispatchEvent::OfferAccepted {
        offer_id,
        order_id,
        driver_id: driver.id,
        declined_offers: acceptance.declined_offer_ids.len(),
    });
    record_transition(state, order_id, OrderStatus::OrderAccepted);
    info!(
        offer_id = %offer_id,
        order_id = %order_id,
        driver_id = %driver.id,
        declined = acceptance.declined_offer_ids.len(),
        "offer accepted"
    );

    Ok(acceptance)
}

pub async fn decline_offer(
    state: &AppState,
    sender: &User,
    offer_id: Uuid,
) -> Result<Offer, AppError> {
    let order_id = state
        .store
        .offers
        .get(&offer_id)
        .map(|offer| offer.order_id)
        .ok_or_else(offer_not_found)?;
    let _order_guard = state.locks.order(order_id).await;

    let (offer, _) = owned_offer(state, sender, offer_id)?;
    if offer.status != OfferStatus::Pending {
        return Err(offer_closed(offer.status));
    }

    state.store.offers.update(&offer_id, |row| {
        row.status = OfferStatus::Declined;
        row.updated_at = Utc::now();
    });
    state
        .metrics
        .offers_total
        .with_label_values(&["declined"])
        .inc();
    info!(offer_id = %offer_id, order_id = %order_id, "offer declined");

    state.store.offers.get(&offer_id).ok_or_else(offer_not_found)
}

/// Pending offers on orders the sender placed, newest first.
pub fn pending_offers_for_sender(state: &AppState, sender: &User) -> Vec<Offer> {
    let mut offers = state.store.offers.filter(|offer| {
        offer.status == OfferStatus::Pending
            && state
                .store
                .orders
                .get(&offer.order_id)
                .is_some_and(|order| order.sender_id == sender.id)
    });
    offers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    offers
}

fn open_order_chat(state: &AppState, order: &DeliveryOrder, driver: &Driver) {
    let channel = ChannelId::for_order(order.id);
    let chat = &state.chat;

    chat_best_effort(
        state,
        order.id,
        "create_channel",
        chat.create_channel(&channel, &MemberId::client(order.sender_id)),
    );
    chat_best_effort(
        state,
        order.id,
        "add_driver",
        chat.add_member(&channel, &MemberId::driver(driver.user_id)),
    );
    if let Some(recipient_id) = order.recipient_id {
        chat_best_effort(
            state,
            order.id,
            "add_recipient",
            chat.add_member(&channel, &MemberId::client(recipient_id)),
        );
    }
}

/// A pending pool row for this driver, or why there is none.
fn pool_entry(state: &AppState, order_id: Uuid, driver_id: Uuid) -> Result<PoolEntry, AppError> {
    let entry = state
        .store
        .pool
        .get(&(order_id, driver_id))
        .ok_or_else(|| AppError::NotFound("order driver pool not found".to_string()))?;
    if entry.status != PoolStatus::Pending {
        return Err(pool_entry_closed(entry.status));
    }
    Ok(entry)
}

/// Offers on someone else's order look the same as missing ones.
fn owned_offer(
    state: &AppState,
    sender: &User,
    offer_id: Uuid,
) -> Result<(Offer, DeliveryOrder), AppError> {
    let offer = state.store.offers.get(&offer_id).ok_or_else(offer_not_found)?;
    let order = state
        .store
        .orders
        .get(&offer.order_id)
        .filter(|order| order.sender_id == sender.id)
        .ok_or_else(offer_not_found)?;
    Ok((offer, order))
}

fn offer_not_found() -> AppError {
    AppError::NotFound("offer not found".to_string())
}

fn already_assigned() -> AppError {
    AppError::Conflict("order already assigned".to_string())
}

fn offer_closed(status: OfferStatus) -> AppError {
    AppError::Conflict(format!("offer is already {}", status.as_str()))
}

fn pool_entry_closed(status: PoolStatus) -> AppError {
    AppError::Conflict(format!("pool entry is already {}", status.as_str()))
}
