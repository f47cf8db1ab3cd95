use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::Json;
use axum::Router;
use serde::Serialize;
use uuid::Uuid;

use crate::api::rest::auth::{CurrentDriver, CurrentUser};
use crate::api::rest::pagination::{paginate, Page, PageQuery};
use crate::engine::lifecycle::{self, RatingScores, ReturnRequest};
use crate::engine::resolve::OrderDraft;
use crate::error::AppError;
use crate::models::balance::Balance;
use crate::models::order::{DeliveryOrder, OrderStatus};
use crate::models::rating::Rating;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", post(create_order).get(driver_orders))
        .route("/orders/purchases", get(purchases))
        .route("/orders/:order_id", get(get_order))
        .route("/orders/:order_id/pickup", put(pickup))
        .route("/orders/:order_id/deliver", put(deliver))
        .route("/orders/:order_id/cancel", put(cancel))
        .route("/orders/:order_id/rate", post(rate))
        .route("/orders/:order_id/return", post(return_order))
}

/// An order seen from one of its parties.
#[derive(Serialize)]
pub struct PurchaseView {
    #[serde(flatten)]
    pub order: DeliveryOrder,
    pub is_sender: bool,
    pub is_receiver: bool,
}

#[derive(Serialize)]
pub struct DeliveredResponse {
    pub order: DeliveryOrder,
    pub balance: Balance,
}

#[derive(Serialize)]
pub struct RatedResponse {
    pub order: DeliveryOrder,
    pub rating: Rating,
}

#[derive(Serialize)]
pub struct ReturnedResponse {
    pub order: DeliveryOrder,
    pub original: DeliveryOrder,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    CurrentUser(sender): CurrentUser,
    Json(draft): Json<OrderDraft>,
) -> Result<Json<DeliveryOrder>, AppError> {
    lifecycle::create_order(&state, &sender, draft).map(Json)
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    _caller: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<DeliveryOrder>, AppError> {
    state.store.order_or_not_found(order_id).map(Json)
}

async fn driver_orders(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<DeliveryOrder>>, AppError> {
    let driver_id = current.driver.id;
    let mut orders = state.store.orders.filter(|order| {
        order.driver_id == Some(driver_id) && order.status != OrderStatus::OrderCreated
    });
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    paginate(orders, query.page).map(Json)
}

async fn purchases(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<PurchaseView>>, AppError> {
    let mut orders = state.store.orders.filter(|order| {
        order.sender_id == user.id || order.recipient_id == Some(user.id)
    });
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let views = orders
        .into_iter()
        .map(|order| PurchaseView {
            is_sender: order.sender_id == user.id,
            is_receiver: order.recipient_id == Some(user.id),
            order,
        })
        .collect();

    paginate(views, query.page).map(Json)
}

async fn pickup(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Path(order_id): Path<Uuid>,
) -> Result<Json<DeliveryOrder>, AppError> {
    lifecycle::pickup(&state, &current.driver, order_id)
        .await
        .map(Json)
}

async fn deliver(
    State(state): State<Arc<AppState>>,
    current: CurrentDriver,
    Path(order_id): Path<Uuid>,
) -> Result<Json<DeliveredResponse>, AppError> {
    let (order, balance) = lifecycle::deliver(&state, &current.driver, order_id).await?;
    Ok(Json(DeliveredResponse { order, balance }))
}

async fn cancel(
    State(state): State<Arc<AppState>>,
    CurrentUser(sender): CurrentUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<DeliveryOrder>, AppError> {
    lifecycle::cancel(&state, &sender, order_id).await.map(Json)
}

async fn rate(
    State(state): State<Arc<AppState>>,
    CurrentUser(sender): CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(scores): Json<RatingScores>,
) -> Result<Json<RatedResponse>, AppError> {
    let (order, rating) = lifecycle::rate(&state, &sender, order_id, scores).await?;
    Ok(Json(RatedResponse { order, rating }))
}

async fn return_order(
    State(state): State<Arc<AppState>>,
    CurrentUser(recipient): CurrentUser,
    Path(order_id): Path<Uuid>,
    Json(request): Json<ReturnRequest>,
) -> Result<Json<ReturnedResponse>, AppError> {
    let (order, original) =
        lifecycle::return_order(&state, &recipient, order_id, request).await?;
    Ok(Json(ReturnedResponse { order, original }))
}
