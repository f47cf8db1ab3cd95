use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::location::GeoPoint;

/// Declared in lifecycle order; transit moves compare by position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    OrderCreated,
    OrderAccepted,
    PickupInProgress,
    ShipmentPickedUp,
    InTransit,
    AtDestinationCity,
    OutForDelivery,
    DeliveryAttempted,
    DeliveryRescheduled,
    ShipmentDelivered,
    OrderCompleted,
    OrderCanceled,
    ShipmentReturned,
}

impl OrderStatus {
    pub const TERMINAL: [OrderStatus; 3] = [
        OrderStatus::OrderCompleted,
        OrderStatus::OrderCanceled,
        OrderStatus::ShipmentReturned,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::OrderCreated => "order_created",
            OrderStatus::OrderAccepted => "order_accepted",
            OrderStatus::PickupInProgress => "pickup_in_progress",
            OrderStatus::ShipmentPickedUp => "shipment_picked_up",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::AtDestinationCity => "at_destination_city",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::DeliveryAttempted => "delivery_attempted",
            OrderStatus::DeliveryRescheduled => "delivery_rescheduled",
            OrderStatus::ShipmentDelivered => "shipment_delivered",
            OrderStatus::OrderCompleted => "order_completed",
            OrderStatus::OrderCanceled => "order_canceled",
            OrderStatus::ShipmentReturned => "shipment_returned",
        }
    }

    pub fn is_terminal(self) -> bool {
        Self::TERMINAL.contains(&self)
    }

    /// Counts toward a driver's trips once the goods reached the recipient.
    pub fn is_trip_done(self) -> bool {
        matches!(
            self,
            OrderStatus::ShipmentDelivered | OrderStatus::OrderCompleted
        )
    }

    fn is_in_transit(self) -> bool {
        matches!(
            self,
            OrderStatus::ShipmentPickedUp
                | OrderStatus::InTransit
                | OrderStatus::AtDestinationCity
                | OrderStatus::OutForDelivery
                | OrderStatus::DeliveryAttempted
                | OrderStatus::DeliveryRescheduled
        )
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        match self {
            OrderCreated => matches!(next, OrderAccepted | OrderCanceled),
            OrderAccepted => matches!(next, PickupInProgress | ShipmentPickedUp | OrderCanceled),
            PickupInProgress => matches!(next, ShipmentPickedUp | OrderCanceled),
            status if status.is_in_transit() => {
                next == ShipmentDelivered || (next.is_in_transit() && next > status)
            }
            ShipmentDelivered => matches!(next, OrderCompleted | ShipmentReturned),
            OrderCompleted => next == ShipmentReturned,
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryOrder {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub recipient_id: Option<Uuid>,
    pub recipient_phone_number: String,
    pub location_id: Uuid,
    pub pickup: GeoPoint,
    pub destination_id: Uuid,
    pub category_id: Uuid,
    pub size_id: Option<Uuid>,
    pub truck_type_id: Option<Uuid>,
    pub truck_model_id: Option<Uuid>,
    pub delivery_time_id: Uuid,
    pub shipment_content_ids: Vec<Uuid>,
    pub extra_service_ids: Vec<Uuid>,
    pub quantity: u32,
    pub notes: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub amount: Option<f64>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeliveryOrder {
    pub fn is_assigned(&self) -> bool {
        self.driver_id.is_some()
    }

    pub fn is_active_for_driver(&self, driver_id: Uuid) -> bool {
        self.driver_id == Some(driver_id) && !self.status.is_terminal()
    }
}
