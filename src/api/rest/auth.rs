use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::driver::Driver;
use crate::models::user::User;
use crate::state::AppState;

/// Set by the gateway in front of the service.
pub const USER_ID_HEADER: &str = "x-user-id";

pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .ok_or(AppError::Unauthorized)?;

        state
            .store
            .users
            .get(&user_id)
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// The caller's driver profile, which every driver-side route needs.
pub struct CurrentDriver {
    pub user: User,
    pub driver: Driver,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentDriver {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        let driver = state
            .store
            .driver_for_user(user.id)
            .ok_or_else(|| AppError::NotFound("driver not found".to_string()))?;

        Ok(CurrentDriver { user, driver })
    }
}
