use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::rest::auth::CurrentUser;
use crate::engine::stats::{user_stats, UserStats};
use crate::error::AppError;
use crate::models::user::{is_e164, User, UserSettings};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(register_user))
        .route("/users/me", get(me))
        .route("/users/me/settings", put(update_settings))
        .route("/users/:user_id/stats", get(stats))
}

#[derive(Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub settings: UserSettings,
}

async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<Json<User>, AppError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(AppError::Unprocessable("name is required".to_string()));
    }
    if !is_e164(&payload.phone) {
        return Err(AppError::Unprocessable(
            "phone must be in E.164 format".to_string(),
        ));
    }

    let user = state.store.register_user(User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        phone: payload.phone,
        settings: payload.settings,
        created_at: Utc::now(),
    })?;

    let resolved = state.store.resolve_recipient_orders(&user.phone, user.id);
    info!(user_id = %user.id, resolved_orders = resolved, "user registered");

    Ok(Json(user))
}

async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(update): Json<UserSettings>,
) -> Result<Json<User>, AppError> {
    state
        .store
        .users
        .update(&user.id, |row| {
            row.settings.merge(update);
            row.clone()
        })
        .map(Json)
        .ok_or(AppError::Unauthorized)
}

async fn stats(
    State(state): State<Arc<AppState>>,
    _caller: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserStats>, AppError> {
    if !state.store.users.contains(&user_id) {
        return Err(AppError::NotFound("user not found".to_string()));
    }
    Ok(Json(user_stats(&state.store, user_id, Utc::now())))
}
