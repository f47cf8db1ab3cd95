use dashmap::DashMap;

use crate::error::AppError;

pub const MAX_ORDERS_PER_TRIP: &str = "max_orders_per_trip";

/// Global key/value settings, edited at runtime by operators.
#[derive(Default)]
pub struct SettingsStore {
    values: DashMap<String, String>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|value| value.value().clone())
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn max_orders_per_trip(&self) -> Result<i64, AppError> {
        let raw = self.get(MAX_ORDERS_PER_TRIP).ok_or_else(|| {
            AppError::Internal(format!("setting {MAX_ORDERS_PER_TRIP} is not configured"))
        })?;

        raw.trim().parse::<i64>().map_err(|err| {
            AppError::Internal(format!("invalid {MAX_ORDERS_PER_TRIP} {raw:?}: {err}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{SettingsStore, MAX_ORDERS_PER_TRIP};
    use crate::error::AppError;

    #[test]
    fn max_orders_per_trip_is_parsed() {
        let settings = SettingsStore::new();
        assert!(matches!(
            settings.max_orders_per_trip(),
            Err(AppError::Internal(_))
        ));

        settings.set(MAX_ORDERS_PER_TRIP, " 7 ");
        assert_eq!(settings.max_orders_per_trip().unwrap(), 7);

        settings.set(MAX_ORDERS_PER_TRIP, "lots");
        assert!(settings.max_orders_per_trip().is_err());
    }
}
