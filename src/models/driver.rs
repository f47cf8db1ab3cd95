use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::location::GeoPoint;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: Uuid,
    pub user_id: Uuid,
    pub transportation_mode_id: Uuid,
    pub car: String,
    pub id_number: String,
    pub gender: Option<Gender>,
    pub location: GeoPoint,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
