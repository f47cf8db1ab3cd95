use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PoolStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
}

impl PoolStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PoolStatus::Pending => "pending",
            PoolStatus::Accepted => "accepted",
            PoolStatus::Rejected => "rejected",
            PoolStatus::Expired => "expired",
        }
    }
}

/// Candidacy of one driver for one order, before any price is proposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEntry {
    pub order_id: Uuid,
    pub driver_id: Uuid,
    pub status: PoolStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PoolEntry {
    pub fn pending(order_id: Uuid, driver_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            order_id,
            driver_id,
            status: PoolStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Pending is the only state a pool entry can leave.
    pub fn resolve(&mut self, status: PoolStatus) -> bool {
        if self.status != PoolStatus::Pending || status == PoolStatus::Pending {
            return false;
        }
        self.status = status;
        self.updated_at = Utc::now();
        true
    }
}
