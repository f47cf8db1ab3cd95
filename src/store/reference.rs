use std::path::Path;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::config::MAX_DURATION_SECS;
use crate::error::AppError;
use crate::geo::haversine_km;
use crate::models::location::{GeoPoint, Location};
use crate::models::reference::{
    Category, DeliveryTime, ExtraService, ShipmentContent, Size, TransportationMode, TruckModel,
    TruckType,
};
use crate::store::table::{Record, Table};

keyed_by_id!(
    Location,
    Category,
    Size,
    TruckType,
    TruckModel,
    DeliveryTime,
    ShipmentContent,
    ExtraService,
    TransportationMode,
);

/// Shape of the `SEED_PATH` file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReferenceSeed {
    pub locations: Vec<Location>,
    pub categories: Vec<Category>,
    pub sizes: Vec<Size>,
    pub truck_types: Vec<TruckType>,
    pub truck_models: Vec<TruckModel>,
    pub delivery_times: Vec<DeliveryTime>,
    pub shipment_contents: Vec<ShipmentContent>,
    pub extra_services: Vec<ExtraService>,
    pub transportation_modes: Vec<TransportationMode>,
}

impl ReferenceSeed {
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            AppError::Internal(format!("failed to read seed {}: {err}", path.display()))
        })?;

        let seed: Self = serde_json::from_str(&raw).map_err(|err| {
            AppError::Internal(format!("invalid seed {}: {err}", path.display()))
        })?;
        seed.validate()?;
        Ok(seed)
    }

    /// Delivery windows must fit in `[0, MAX_DURATION_SECS]`.
    pub fn validate(&self) -> Result<(), AppError> {
        match self
            .delivery_times
            .iter()
            .find(|tier| !(0..=MAX_DURATION_SECS).contains(&tier.duration_secs))
        {
            Some(tier) => Err(AppError::Internal(format!(
                "delivery time {} has out-of-range duration_secs {}",
                tier.name, tier.duration_secs
            ))),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct ReferenceData {
    pub locations: Table<Location>,
    pub categories: Table<Category>,
    pub sizes: Table<Size>,
    pub truck_types: Table<TruckType>,
    pub truck_models: Table<TruckModel>,
    pub delivery_times: Table<DeliveryTime>,
    pub shipment_contents: Table<ShipmentContent>,
    pub extra_services: Table<ExtraService>,
    pub transportation_modes: Table<TransportationMode>,
}

impl ReferenceData {
    pub fn load(&self, seed: ReferenceSeed) {
        let ReferenceSeed {
            locations,
            categories,
            sizes,
            truck_types,
            truck_models,
            delivery_times,
            shipment_contents,
            extra_services,
            transportation_modes,
        } = seed;

        info!(
            locations = locations.len(),
            categories = categories.len(),
            delivery_times = delivery_times.len(),
            "loading reference data"
        );

        locations.into_iter().for_each(|row| self.locations.upsert(row));
        categories.into_iter().for_each(|row| self.categories.upsert(row));
        sizes.into_iter().for_each(|row| self.sizes.upsert(row));
        truck_types.into_iter().for_each(|row| self.truck_types.upsert(row));
        truck_models.into_iter().for_each(|row| self.truck_models.upsert(row));
        delivery_times
            .into_iter()
            .for_each(|row| self.delivery_times.upsert(row));
        shipment_contents
            .into_iter()
            .for_each(|row| self.shipment_contents.upsert(row));
        extra_services
            .into_iter()
            .for_each(|row| self.extra_services.upsert(row));
        transportation_modes
            .into_iter()
            .for_each(|row| self.transportation_modes.upsert(row));
    }

    pub fn nearest_location(&self, point: &GeoPoint) -> Option<Location> {
        self.locations
            .all()
            .into_iter()
            .min_by(|a, b| haversine_km(&a.point, point).total_cmp(&haversine_km(&b.point, point)))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::{ReferenceData, ReferenceSeed};
    use crate::config::MAX_DURATION_SECS;
    use crate::models::location::{GeoPoint, Location};
    use crate::models::reference::DeliveryTime;

    fn location(name: &str, lat: f64, lng: f64) -> Location {
        Location {
            id: Uuid::new_v4(),
            name: name.to_string(),
            point: GeoPoint { lat, lng },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn nearest_location_picks_closest_city() {
        let data = ReferenceData::default();
        assert!(data.nearest_location(&GeoPoint::new(24.7, 46.6)).is_none());

        let riyadh = location("Riyadh", 24.7136, 46.6753);
        let jeddah = location("Jeddah", 21.4858, 39.1925);
        data.load(ReferenceSeed {
            locations: vec![riyadh.clone(), jeddah],
            ..Default::default()
        });

        let nearest = data.nearest_location(&GeoPoint::new(24.7, 46.6)).unwrap();
        assert_eq!(nearest.id, riyadh.id);
    }

    #[test]
    fn seed_parses_with_missing_sections() {
        let seed: ReferenceSeed = serde_json::from_str(
            r#"{"categories":[{"id":"6f1c3d7e-0c57-4e0b-9a39-3f0f3c6f9a01","name":"Parcels"}]}"#,
        )
        .unwrap();

        assert_eq!(seed.categories.len(), 1);
        assert!(!seed.categories[0].is_truck);
        assert!(seed.locations.is_empty());
    }

    #[test]
    fn seed_rejects_out_of_range_delivery_windows() {
        let tier = |duration_secs| DeliveryTime {
            id: Uuid::new_v4(),
            name: "Express".to_string(),
            duration_secs,
        };

        let ok = ReferenceSeed {
            delivery_times: vec![tier(0), tier(7_200), tier(MAX_DURATION_SECS)],
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        for bad in [-1, MAX_DURATION_SECS + 1, i64::MAX] {
            let seed = ReferenceSeed {
                delivery_times: vec![tier(7_200), tier(bad)],
                ..Default::default()
            };
            assert!(seed.validate().is_err());
        }
    }
}
