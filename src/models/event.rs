use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::order::OrderStatus;

/// Broadcast to websocket subscribers whenever the negotiation moves.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchEvent {
    PoolEntryCreated {
        order_id: Uuid,
        driver_id: Uuid,
        distance_km: f64,
    },
    OfferCreated {
        offer_id: Uuid,
        order_id: Uuid,
        driver_id: Uuid,
        amount: f64,
    },
    OfferAccepted {
        offer_id: Uuid,
        order_id: Uuid,
        driver_id: Uuid,
        declined_offers: usize,
    },
    OrderStatusChanged {
        order_id: Uuid,
        status: OrderStatus,
        at: DateTime<Utc>,
    },
}
