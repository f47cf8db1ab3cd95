use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::rest::auth::CurrentDriver;
use crate::api::rest::pagination::{paginate, Page};
use crate::engine::listing::{driver_pool, ArrivalWindow, PoolListing, PoolOrdering};
use crate::engine::negotiation::{self, PoolAcceptance};
use crate::error::AppError;
use crate::models::pool::PoolEntry;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/orders/driver-pools/by-category/:category_id",
            get(list_pool),
        )
        .route(
            "/orders/driver-pools/by-order/:order_id/accept",
            put(accept_entry),
        )
        .route(
            "/orders/driver-pools/by-order/:order_id/decline",
            put(decline_entry),
        )
}

#[derive(Debug, Default, Deserialize)]
pub struct PoolQuery {
    pub page: Option<usize>,
    pub order_by: Option<String>,
    pub by_arrival: Option<String>,
}

#[derive(Deserialize)]
pub struct AcceptEntryRequest {
    pub amount: f64,
}

async fn list_pool(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Path(category_id): Path<Uuid>,
    Query(query): Query<PoolQuery>,
) -> Result<Json<Page<PoolListing>>, AppError> {
    let listings = driver_pool(
        &state.store,
        &current.driver,
        category_id,
        PoolOrdering::parse(query.order_by.as_deref()),
        ArrivalWindow::parse(query.by_arrival.as_deref()),
        Utc::now(),
    );

    paginate(listings, query.page).map(Json)
}

async fn accept_entry(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<AcceptEntryRequest>,
) -> Result<Json<PoolAcceptance>, AppError> {
    negotiation::accept_pool_entry(&state, &current.driver, order_id, payload.amount)
        .await
        .map(Json)
}

async fn decline_entry(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Path(order_id): Path<Uuid>,
) -> Result<Json<PoolEntry>, AppError> {
    negotiation::decline_pool_entry(&state, &current.driver, order_id)
        .await
        .map(Json)
}
