//! Order creation and the status transitions after assignment. Each
//! transition is scoped to one party; the wrong party gets `NotFound`.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::engine::resolve::{build_order, OrderDraft};
use crate::engine::{chat_best_effort, eligibility, record_transition};
use crate::error::AppError;
use crate::models::balance::Balance;
use crate::models::driver::Driver;
use crate::models::location::GeoPoint;
use crate::models::offer::OfferStatus;
use crate::models::order::{DeliveryOrder, OrderStatus};
use crate::models::rating::Rating;
use crate::models::user::User;
use crate::services::chat::{ChannelId, MemberId};
use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatingScores {
    #[serde(default)]
    pub fast_rating: Option<f64>,
    #[serde(default)]
    pub experience_rating: Option<f64>,
    #[serde(default)]
    pub recommended_rating: Option<f64>,
}

impl RatingScores {
    fn validate(&self) -> Result<(), AppError> {
        let scores = [
            self.fast_rating,
            self.experience_rating,
            self.recommended_rating,
        ];
        if scores
            .iter()
            .flatten()
            .any(|score| !(0.0..=5.0).contains(score))
        {
            return Err(AppError::Unprocessable(
                "ratings must be between 0 and 5".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReturnRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

pub fn create_order(
    state: &AppState,
    sender: &User,
    draft: OrderDraft,
) -> Result<DeliveryOrder, AppError> {
    let order = build_order(&state.store, sender.id, draft)?;
    state.store.orders.upsert(order.clone());

    info!(order_id = %order.id, sender_id = %sender.id, "order created");
    record_transition(state, order.id, OrderStatus::OrderCreated);
    eligibility::on_order_created(state, &order);

    Ok(order)
}

pub async fn pickup(
    state: &AppState,
    driver: &Driver,
    order_id: Uuid,
) -> Result<DeliveryOrder, AppError> {
    let order = {
        let _guard = state.locks.order(order_id).await;
        let order = driver_order(state, driver, order_id)?;
        advance(state, &order, OrderStatus::ShipmentPickedUp)?
    };

    record_transition(state, order_id, order.status);
    info!(order_id = %order_id, driver_id = %driver.id, "shipment picked up");
    Ok(order)
}

/// Marks delivery and books the driver's earnings for the order.
pub async fn deliver(
    state: &AppState,
    driver: &Driver,
    order_id: Uuid,
) -> Result<(DeliveryOrder, Balance), AppError> {
    let (order, balance) = {
        let _guard = state.locks.order(order_id).await;
        let order = driver_order(state, driver, order_id)?;
        ensure_transition(&order, OrderStatus::ShipmentDelivered)?;

        let balance = Balance {
            id: Uuid::new_v4(),
            order_id,
            driver_id: driver.id,
            balance: order.amount.unwrap_or_default(),
            created_at: Utc::now(),
        };
        state.store.balances.upsert(balance.clone());
        (advance(state, &order, OrderStatus::ShipmentDelivered)?, balance)
    };

    let channel = ChannelId::for_order(order_id);
    chat_best_effort(
        state,
        order_id,
        "remove_driver",
        state
            .chat
            .remove_member(&channel, &MemberId::driver(driver.user_id)),
    );
    if let Some(recipient_id) = order.recipient_id {
        chat_best_effort(
            state,
            order_id,
            "remove_recipient",
            state
                .chat
                .remove_member(&channel, &MemberId::client(recipient_id)),
        );
    }

    record_transition(state, order_id, order.status);
    info!(order_id = %order_id, driver_id = %driver.id, balance = balance.balance, "shipment delivered");
    Ok((order, balance))
}

/// Also declines the offers still pending on the order.
pub async fn cancel(
    state: &AppState,
    sender: &User,
    order_id: Uuid,
) -> Result<DeliveryOrder, AppError> {
    let (order, was_assigned, declined) = {
        let _guard = state.locks.order(order_id).await;
        let order = sender_order(state, sender, order_id)?;
        ensure_transition(&order, OrderStatus::OrderCanceled)?;

        let now = Utc::now();
        let pending = state.store.offers.keys_where(|offer| {
            offer.order_id == order_id && offer.status == OfferStatus::Pending
        });
        for offer_id in &pending {
            state.store.offers.update(offer_id, |offer| {
                offer.status = OfferStatus::Declined;
                offer.updated_at = now;
            });
        }

        let was_assigned = order.is_assigned();
        (
            advance(state, &order, OrderStatus::OrderCanceled)?,
            was_assigned,
            pending.len(),
        )
    };

    if was_assigned {
        let channel = ChannelId::for_order(order_id);
        chat_best_effort(
            state,
            order_id,
            "remove_sender",
            state
                .chat
                .remove_member(&channel, &MemberId::client(sender.id)),
        );
        if let Some(recipient_id) = order.recipient_id {
            chat_best_effort(
                state,
                order_id,
                "remove_recipient",
                state
                    .chat
                    .remove_member(&channel, &MemberId::client(recipient_id)),
            );
        }
    }

    state
        .metrics
        .offers_total
        .with_label_values(&["declined"])
        .inc_by(declined as u64);
    record_transition(state, order_id, order.status);
    info!(order_id = %order_id, declined_offers = declined, "order canceled");
    Ok(order)
}

/// One rating per order; rating a delivered order completes it.
pub async fn rate(
    state: &AppState,
    sender: &User,
    order_id: Uuid,
    scores: RatingScores,
) -> Result<(DeliveryOrder, Rating), AppError> {
    scores.validate()?;

    let (order, rating) = {
        let _guard = state.locks.order(order_id).await;
        let order = sender_order(state, sender, order_id)?;
        if state.store.ratings.contains(&order_id) {
            return Err(AppError::Conflict("order already rated".to_string()));
        }
        ensure_transition(&order, OrderStatus::OrderCompleted)?;

        let rating = Rating {
            id: Uuid::new_v4(),
            order_id,
            user_id: sender.id,
            fast_rating: scores.fast_rating,
            experience_rating: scores.experience_rating,
            recommended_rating: scores.recommended_rating,
            created_at: Utc::now(),
        };
        if state.store.ratings.insert_new(rating.clone()).is_err() {
            return Err(AppError::Conflict("order already rated".to_string()));
        }
        (advance(state, &order, OrderStatus::OrderCompleted)?, rating)
    };

    chat_best_effort(
        state,
        order_id,
        "remove_sender",
        state.chat.remove_member(
            &ChannelId::for_order(order_id),
            &MemberId::client(sender.id),
        ),
    );

    record_transition(state, order_id, order.status);
    info!(order_id = %order_id, "order rated");
    Ok((order, rating))
}

/// The recipient sends the goods back: a new order from the recipient to
/// the original pickup location, addressed to the original sender.
/// Returns the new order and the original one.
pub async fn return_order(
    state: &AppState,
    recipient: &User,
    order_id: Uuid,
    request: ReturnRequest,
) -> Result<(DeliveryOrder, DeliveryOrder), AppError> {
    let pickup = GeoPoint::new(request.latitude, request.longitude);
    if !pickup.is_valid() {
        return Err(AppError::Unprocessable(
            "latitude or longitude out of range".to_string(),
        ));
    }

    let (created, original) = {
        let _guard = state.locks.order(order_id).await;
        let original = state
            .store
            .orders
            .get(&order_id)
            .filter(|order| order.recipient_id == Some(recipient.id))
            .ok_or_else(order_not_found)?;
        ensure_transition(&original, OrderStatus::ShipmentReturned)?;

        let original_sender = state.store.users.get(&original.sender_id).ok_or_else(|| {
            AppError::Internal(format!("sender of order {order_id} is missing"))
        })?;

        let draft = OrderDraft {
            category_id: original.category_id,
            size_id: original.size_id,
            truck_type_id: original.truck_type_id,
            truck_model_id: original.truck_model_id,
            delivery_time_id: original.delivery_time_id,
            shipment_content_ids: original.shipment_content_ids.clone(),
            extra_service_ids: original.extra_service_ids.clone(),
            destination_id: original.location_id,
            quantity: original.quantity,
            recipient_phone_number: original_sender.phone,
            notes: request.notes,
            payment_method: original.payment_method,
            latitude: pickup.lat,
            longitude: pickup.lng,
        };
        let created = build_order(&state.store, recipient.id, draft)?;
        state.store.orders.upsert(created.clone());

        (created, advance(state, &original, OrderStatus::ShipmentReturned)?)
    };

    record_transition(state, original.id, original.status);
    record_transition(state, created.id, created.status);
    info!(
        order_id = %original.id,
        return_order_id = %created.id,
        "shipment returned"
    );
    eligibility::on_order_created(state, &created);

    Ok((created, original))
}

fn order_not_found() -> AppError {
    AppError::NotFound("order not found".to_string())
}

fn driver_order(state: &AppState, driver: &Driver, order_id: Uuid) -> Result<DeliveryOrder, AppError> {
    state
        .store
        .orders
        .get(&order_id)
        .filter(|order| order.driver_id == Some(driver.id))
        .ok_or_else(order_not_found)
}

fn sender_order(state: &AppState, sender: &User, order_id: Uuid) -> Result<DeliveryOrder, AppError> {
    state
        .store
        .orders
        .get(&order_id)
        .filter(|order| order.sender_id == sender.id)
        .ok_or_else(order_not_found)
}

fn ensure_transition(order: &DeliveryOrder, to: OrderStatus) -> Result<(), AppError> {
    if order.status.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition {
            from: order.status,
            to,
        })
    }
}

/// Caller holds the order lock.
fn advance(
    state: &AppState,
    order: &DeliveryOrder,
    to: OrderStatus,
) -> Result<DeliveryOrder, AppError> {
    ensure_transition(order, to)?;
    state
        .store
        .orders
        .update(&order.id, |row| {
            row.status = to;
            row.updated_at = Utc::now();
            row.clone()
        })
        .ok_or_else(order_not_found)
}
