use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::config::DispatchConfig;
use crate::engine::resolve::OrderDraft;
use crate::models::driver::Driver;
use crate::models::location::{GeoPoint, Location};
use crate::models::order::DeliveryOrder;
use crate::models::reference::{
    Category, DeliveryTime, ShipmentContent, Size, TransportationMode, TruckModel, TruckType,
};
use crate::models::user::{User, UserSettings};
use crate::services::chat::InMemoryChat;
use crate::state::AppState;
use crate::store::reference::ReferenceSeed;

static PHONES: AtomicU64 = AtomicU64::new(1);

/// Seeded marketplace around Riyadh with a destination in Jeddah.
pub(crate) struct Fixture {
    pub state: AppState,
    pub chat: Arc<InMemoryChat>,
    pub riyadh_id: Uuid,
    pub jeddah_id: Uuid,
    pub category_id: Uuid,
    pub truck_category_id: Uuid,
    pub size_id: Uuid,
    pub truck_type_id: Uuid,
    pub truck_model_id: Uuid,
    pub same_day_id: Uuid,
    pub next_day_id: Uuid,
    pub content_id: Uuid,
    pub mode_id: Uuid,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(DispatchConfig::default())
    }

    pub fn with_config(dispatch: DispatchConfig) -> Self {
        let chat = Arc::new(InMemoryChat::new());
        let state = AppState::with_chat(dispatch, 64, chat.clone());

        let location = |name: &str, lat: f64, lng: f64| Location {
            id: Uuid::new_v4(),
            name: name.to_string(),
            point: GeoPoint::new(lat, lng),
            created_at: Utc::now(),
        };
        let riyadh = location("Riyadh", 24.7136, 46.6753);
        let jeddah = location("Jeddah", 21.4858, 39.1925);

        let category = Category {
            id: Uuid::new_v4(),
            name: "Parcel".to_string(),
            is_truck: false,
        };
        let truck_category = Category {
            id: Uuid::new_v4(),
            name: "Freight".to_string(),
            is_truck: true,
        };
        let size = Size {
            id: Uuid::new_v4(),
            name: "Small".to_string(),
        };
        let truck_type = TruckType {
            id: Uuid::new_v4(),
            name: "Flatbed".to_string(),
        };
        let truck_model = TruckModel {
            id: Uuid::new_v4(),
            name: "Actros".to_string(),
        };
        let same_day = DeliveryTime {
            id: Uuid::new_v4(),
            name: "Same day".to_string(),
            duration_secs: 2 * 3600,
        };
        let next_day = DeliveryTime {
            id: Uuid::new_v4(),
            name: "Next day".to_string(),
            duration_secs: 30 * 3600,
        };
        let content = ShipmentContent {
            id: Uuid::new_v4(),
            name: "Documents".to_string(),
        };
        let mode = TransportationMode {
            id: Uuid::new_v4(),
            name: "Car".to_string(),
        };

        let fixture = Self {
            riyadh_id: riyadh.id,
            jeddah_id: jeddah.id,
            category_id: category.id,
            truck_category_id: truck_category.id,
            size_id: size.id,
            truck_type_id: truck_type.id,
            truck_model_id: truck_model.id,
            same_day_id: same_day.id,
            next_day_id: next_day.id,
            content_id: content.id,
            mode_id: mode.id,
            state,
            chat,
        };

        fixture.state.store.reference.load(ReferenceSeed {
            locations: vec![riyadh, jeddah],
            categories: vec![category, truck_category],
            sizes: vec![size],
            truck_types: vec![truck_type],
            truck_models: vec![truck_model],
            delivery_times: vec![same_day, next_day],
            shipment_contents: vec![content],
            extra_services: Vec::new(),
            transportation_modes: vec![mode],
        });

        fixture
    }

    pub fn user(&self, available: bool) -> User {
        let n = PHONES.fetch_add(1, Ordering::Relaxed);
        let user = User {
            id: Uuid::new_v4(),
            name: format!("user {n}"),
            phone: format!("+9665{n:08}"),
            settings: UserSettings {
                is_available: Some(available),
                ..UserSettings::default()
            },
            created_at: Utc::now(),
        };
        self.state.store.register_user(user).unwrap()
    }

    /// Registers a driver without running the eligibility fan-out.
    pub fn driver_at(&self, point: GeoPoint, available: bool) -> Driver {
        let owner = self.user(available);
        let n = PHONES.fetch_add(1, Ordering::Relaxed);
        self.state
            .store
            .add_driver(Driver {
                id: Uuid::new_v4(),
                user_id: owner.id,
                transportation_mode_id: self.mode_id,
                car: "Hilux".to_string(),
                id_number: format!("ID-{n}"),
                gender: None,
                location: point,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .unwrap()
    }

    pub fn draft(&self, pickup: GeoPoint, recipient_phone: &str) -> OrderDraft {
        OrderDraft {
            category_id: self.category_id,
            size_id: Some(self.size_id),
            truck_type_id: None,
            truck_model_id: None,
            delivery_time_id: self.same_day_id,
            shipment_content_ids: vec![self.content_id],
            extra_service_ids: Vec::new(),
            destination_id: self.jeddah_id,
            quantity: 1,
            recipient_phone_number: recipient_phone.to_string(),
            notes: None,
            payment_method: None,
            latitude: pickup.lat,
            longitude: pickup.lng,
        }
    }

    /// Creates an order through the lifecycle, fan-out included.
    pub fn order(&self, sender: &User, pickup: GeoPoint, recipient_phone: &str) -> DeliveryOrder {
        let draft = self.draft(pickup, recipient_phone);
        crate::engine::lifecycle::create_order(&self.state, sender, draft).unwrap()
    }
}
