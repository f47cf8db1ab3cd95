//! Turns a client draft into a storable order. Shared by order creation
//! and returns, which must resolve reference data the same way.

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::location::GeoPoint;
use crate::models::order::{DeliveryOrder, OrderStatus, PaymentMethod};
use crate::models::user::is_e164;
use crate::store::Store;

const MAX_NOTES_LEN: usize = 255;

#[derive(Debug, Clone, Deserialize)]
pub struct OrderDraft {
    pub category_id: Uuid,
    #[serde(default)]
    pub size_id: Option<Uuid>,
    #[serde(default)]
    pub truck_type_id: Option<Uuid>,
    #[serde(default)]
    pub truck_model_id: Option<Uuid>,
    pub delivery_time_id: Uuid,
    pub shipment_content_ids: Vec<Uuid>,
    #[serde(default)]
    pub extra_service_ids: Vec<Uuid>,
    pub destination_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub recipient_phone_number: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    pub latitude: f64,
    pub longitude: f64,
}

fn default_quantity() -> u32 {
    1
}

impl OrderDraft {
    pub fn pickup(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    fn validate(&self) -> Result<(), AppError> {
        if !self.pickup().is_valid() {
            return Err(unprocessable("latitude or longitude out of range"));
        }
        if !is_e164(&self.recipient_phone_number) {
            return Err(unprocessable(
                "recipient_phone_number must be in E.164 format",
            ));
        }
        if self.shipment_content_ids.is_empty() {
            return Err(unprocessable("shipment_content_ids must not be empty"));
        }
        if self.quantity == 0 {
            return Err(unprocessable("quantity must be at least 1"));
        }
        if self
            .notes
            .as_ref()
            .is_some_and(|notes| notes.chars().count() > MAX_NOTES_LEN)
        {
            return Err(unprocessable("notes must be at most 255 characters"));
        }
        Ok(())
    }
}

/// Validates the draft against the reference tables and builds an
/// unassigned `order_created` order. Nothing is written.
pub fn build_order(
    store: &Store,
    sender_id: Uuid,
    draft: OrderDraft,
) -> Result<DeliveryOrder, AppError> {
    draft.validate()?;
    let reference = &store.reference;

    let category = reference
        .categories
        .get(&draft.category_id)
        .ok_or_else(|| unprocessable("category not found"))?;

    if !reference.locations.contains(&draft.destination_id) {
        return Err(unprocessable("destination not found"));
    }

    let (size_id, truck_type_id, truck_model_id) = if category.is_truck {
        let truck_type_id = draft
            .truck_type_id
            .filter(|id| reference.truck_types.contains(id))
            .ok_or_else(|| unprocessable("truck type not found"))?;
        let truck_model_id = draft
            .truck_model_id
            .filter(|id| reference.truck_models.contains(id))
            .ok_or_else(|| unprocessable("truck model not found"))?;
        (None, Some(truck_type_id), Some(truck_model_id))
    } else {
        let size_id = draft
            .size_id
            .filter(|id| reference.sizes.contains(id))
            .ok_or_else(|| unprocessable("size not found"))?;
        (Some(size_id), None, None)
    };

    if !reference.delivery_times.contains(&draft.delivery_time_id) {
        return Err(unprocessable("delivery time not found"));
    }
    if !draft
        .shipment_content_ids
        .iter()
        .all(|id| reference.shipment_contents.contains(id))
    {
        return Err(unprocessable("shipment content not found"));
    }
    if !draft
        .extra_service_ids
        .iter()
        .all(|id| reference.extra_services.contains(id))
    {
        return Err(unprocessable("extra service not found"));
    }

    let pickup = draft.pickup();
    let location = reference
        .nearest_location(&pickup)
        .ok_or_else(|| unprocessable("location not found"))?;

    let recipient_id = store
        .user_by_phone(&draft.recipient_phone_number)
        .map(|user| user.id);

    let now = Utc::now();
    Ok(DeliveryOrder {
        id: Uuid::new_v4(),
        sender_id,
        driver_id: None,
        recipient_id,
        recipient_phone_number: draft.recipient_phone_number,
        location_id: location.id,
        pickup,
        destination_id: draft.destination_id,
        category_id: category.id,
        size_id,
        truck_type_id,
        truck_model_id,
        delivery_time_id: draft.delivery_time_id,
        shipment_content_ids: draft.shipment_content_ids,
        extra_service_ids: draft.extra_service_ids,
        quantity: draft.quantity,
        notes: draft.notes,
        payment_method: draft.payment_method,
        amount: None,
        status: OrderStatus::OrderCreated,
        created_at: now,
        updated_at: now,
    })
}

fn unprocessable(message: &str) -> AppError {
    AppError::Unprocessable(message.to_string())
}
