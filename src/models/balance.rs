use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Driver earnings for one delivered order. Never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Balance {
    pub id: Uuid,
    pub order_id: Uuid,
    pub driver_id: Uuid,
    pub balance: f64,
    pub created_at: DateTime<Utc>,
}
