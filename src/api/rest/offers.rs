use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, put};
use axum::Json;
use axum::Router;
use uuid::Uuid;

use crate::api::rest::auth::CurrentUser;
use crate::api::rest::pagination::{paginate, Page, PageQuery};
use crate::engine::negotiation::{self, OfferAcceptance};
use crate::error::AppError;
use crate::models::offer::Offer;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/offers", get(list_offers))
        .route("/offers/:offer_id/accept", put(accept_offer))
        .route("/offers/:offer_id/decline", put(decline_offer))
}

async fn list_offers(
    State(state): State<Arc<AppState>>,
    CurrentUser(sender): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<Offer>>, AppError> {
    let offers = negotiation::pending_offers_for_sender(&state, &sender);
    paginate(offers, query.page).map(Json)
}

async fn accept_offer(
    State(state): State<Arc<AppState>>,
    CurrentUser(sender): CurrentUser,
    Path(offer_id): Path<Uuid>,
) -> Result<Json<OfferAcceptance>, AppError> {
    negotiation::accept_offer(&state, &sender, offer_id)
        .await
        .map(Json)
}

async fn decline_offer(
    State(state): State<Arc<AppState>>,
    CurrentUser(sender): CurrentUser,
    Path(offer_id): Path<Uuid>,
) -> Result<Json<Offer>, AppError> {
    negotiation::decline_offer(&state, &sender, offer_id)
        .await
        .map(Json)
}
