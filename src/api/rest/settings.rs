use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;

use crate::api::rest::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

/// Read-only. Values come from configuration at startup.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/settings/:key", get(get_setting))
}

#[derive(Serialize)]
pub struct SettingResponse {
    pub key: String,
    pub value: String,
}

async fn get_setting(
    State(state): State<Arc<AppState>>,
    _caller: CurrentUser,
    Path(key): Path<String>,
) -> Result<Json<SettingResponse>, AppError> {
    let value = state
        .settings
        .get(&key)
        .ok_or_else(|| AppError::NotFound(format!("setting {key} not found")))?;

    Ok(Json(SettingResponse { key, value }))
}
