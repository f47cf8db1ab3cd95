macro_rules! keyed_by_id {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Record for $ty {
                type Key = Uuid;

                fn key(&self) -> Uuid {
                    self.id
                }
            }
        )+
    };
}

pub mod locks;
pub mod reference;
pub mod table;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::balance::Balance;
use crate::models::driver::Driver;
use crate::models::offer::{Offer, OfferStatus};
use crate::models::order::DeliveryOrder;
use crate::models::pool::PoolEntry;
use crate::models::rating::Rating;
use crate::models::user::User;
use crate::store::reference::ReferenceData;
use crate::store::table::{Record, Table};

keyed_by_id!(User, Driver, DeliveryOrder, Offer, Balance);

impl Record for PoolEntry {
    type Key = (Uuid, Uuid);

    fn key(&self) -> (Uuid, Uuid) {
        (self.order_id, self.driver_id)
    }
}

/// One rating per order, so the order id is the key.
impl Record for Rating {
    type Key = Uuid;

    fn key(&self) -> Uuid {
        self.order_id
    }
}

/// The shared relational state of the marketplace.
#[derive(Default)]
pub struct Store {
    pub users: Table<User>,
    pub drivers: Table<Driver>,
    pub orders: Table<DeliveryOrder>,
    pub pool: Table<PoolEntry>,
    pub offers: Table<Offer>,
    pub balances: Table<Balance>,
    pub ratings: Table<Rating>,
    pub reference: ReferenceData,
    users_by_phone: DashMap<String, Uuid>,
    drivers_by_user: DashMap<Uuid, Uuid>,
    drivers_by_id_number: DashMap<String, Uuid>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_user(&self, user: User) -> Result<User, AppError> {
        match self.users_by_phone.entry(user.phone.clone()) {
            Entry::Occupied(_) => Err(AppError::Unprocessable(
                "phone number already registered".to_string(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.upsert(user.clone());
                Ok(user)
            }
        }
    }

    pub fn user_by_phone(&self, phone: &str) -> Option<User> {
        let user_id = *self.users_by_phone.get(phone)?.value();
        self.users.get(&user_id)
    }

    /// Enforces one profile per user and one profile per id number.
    pub fn add_driver(&self, driver: Driver) -> Result<Driver, AppError> {
        let by_user = match self.drivers_by_user.entry(driver.user_id) {
            Entry::Occupied(_) => {
                return Err(AppError::Unprocessable(
                    "you have already registered as a driver".to_string(),
                ))
            }
            Entry::Vacant(slot) => slot,
        };

        match self.drivers_by_id_number.entry(driver.id_number.clone()) {
            Entry::Occupied(_) => Err(AppError::Unprocessable(
                "id number already belongs to another driver".to_string(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(driver.id);
                by_user.insert(driver.id);
                self.drivers.upsert(driver.clone());
                Ok(driver)
            }
        }
    }

    pub fn driver_for_user(&self, user_id: Uuid) -> Option<Driver> {
        let driver_id = *self.drivers_by_user.get(&user_id)?.value();
        self.drivers.get(&driver_id)
    }

    pub fn order_or_not_found(&self, order_id: Uuid) -> Result<DeliveryOrder, AppError> {
        self.orders
            .get(&order_id)
            .ok_or_else(|| AppError::NotFound("order not found".to_string()))
    }

    pub fn pending_offer_count(&self, driver_id: Uuid) -> usize {
        self.offers
            .count(|offer| offer.driver_id == driver_id && offer.status == OfferStatus::Pending)
    }

    pub fn active_order_count(&self, driver_id: Uuid) -> usize {
        self.orders
            .count(|order| order.is_active_for_driver(driver_id))
    }

    /// Sets `recipient_id` on every unresolved order addressed to `phone`.
    pub fn resolve_recipient_orders(&self, phone: &str, user_id: Uuid) -> usize {
        let order_ids = self.orders.keys_where(|order| {
            order.recipient_id.is_none() && order.recipient_phone_number == phone
        });

        order_ids
            .iter()
            .filter_map(|order_id| {
                self.orders.update(order_id, |order| {
                    if order.recipient_id.is_none() {
                        order.recipient_id = Some(user_id);
                        order.updated_at = Utc::now();
                    }
                })
            })
            .count()
    }
}
