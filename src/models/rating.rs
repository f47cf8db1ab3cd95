use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub fast_rating: Option<f64>,
    pub experience_rating: Option<f64>,
    pub recommended_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Rating {
    pub fn scores(&self) -> [Option<f64>; 3] {
        [
            self.fast_rating,
            self.experience_rating,
            self.recommended_rating,
        ]
    }
}
