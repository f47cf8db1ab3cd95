use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::rest::auth::{CurrentDriver, CurrentUser};
use crate::api::rest::pagination::{paginate, Page, PageQuery};
use crate::engine::eligibility;
use crate::engine::listing::{drivers_near, NearbyDriver};
use crate::error::AppError;
use crate::models::driver::{Driver, Gender};
use crate::models::location::GeoPoint;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", get(list_drivers).post(create_driver))
        .route("/drivers/me/location", patch(update_location))
        .route("/drivers/by-location/:location_id", get(drivers_by_location))
        .route("/drivers/:driver_id", get(get_driver))
}

#[derive(Deserialize)]
pub struct CreateDriverRequest {
    pub transportation_mode_id: Uuid,
    pub car: String,
    pub id_number: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub latitude: f64,
    pub longitude: f64,
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    let location = GeoPoint::new(payload.latitude, payload.longitude);
    if !location.is_valid() {
        return Err(AppError::Unprocessable(
            "latitude or longitude out of range".to_string(),
        ));
    }
    if payload.car.trim().is_empty() || payload.id_number.trim().is_empty() {
        return Err(AppError::Unprocessable(
            "car and id_number are required".to_string(),
        ));
    }
    if !state
        .store
        .reference
        .transportation_modes
        .contains(&payload.transportation_mode_id)
    {
        return Err(AppError::Unprocessable(
            "transportation mode not found".to_string(),
        ));
    }

    let now = Utc::now();
    let driver = state.store.add_driver(Driver {
        id: Uuid::new_v4(),
        user_id: user.id,
        transportation_mode_id: payload.transportation_mode_id,
        car: payload.car.trim().to_string(),
        id_number: payload.id_number.trim().to_string(),
        gender: payload.gender,
        location,
        created_at: now,
        updated_at: now,
    })?;
    info!(driver_id = %driver.id, user_id = %user.id, "driver registered");

    eligibility::on_driver_created(&state, &driver);

    Ok(Json(driver))
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<Driver>, AppError> {
    let location = GeoPoint::new(payload.latitude, payload.longitude);
    if !location.is_valid() {
        return Err(AppError::Unprocessable(
            "latitude or longitude out of range".to_string(),
        ));
    }

    state
        .store
        .drivers
        .update(&current.driver.id, |driver| {
            driver.location = location;
            driver.updated_at = Utc::now();
            driver.clone()
        })
        .map(Json)
        .ok_or_else(|| AppError::NotFound("driver not found".to_string()))
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    _caller: CurrentUser,
    Path(driver_id): Path<Uuid>,
) -> Result<Json<Driver>, AppError> {
    state
        .store
        .drivers
        .get(&driver_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("driver not found".to_string()))
}

async fn list_drivers(
    State(state): State<Arc<AppState>>,
    _caller: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Driver>>, AppError> {
    let mut drivers = state.store.drivers.all();
    drivers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    paginate(drivers, query.page).map(Json)
}

/// Drivers inside the eligibility radius of a seeded location.
async fn drivers_by_location(
    State(state): State<Arc<AppState>>,
    _caller: CurrentUser,
    Path(location_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<NearbyDriver>>, AppError> {
    let location = state
        .store
        .reference
        .locations
        .get(&location_id)
        .ok_or_else(|| AppError::NotFound("location not found".to_string()))?;

    let nearby = drivers_near(
        &state.store,
        &location.point,
        state.dispatch.eligibility_radius_km,
    );
    paginate(nearby, query.page).map(Json)
}
