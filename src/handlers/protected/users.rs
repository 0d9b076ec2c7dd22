// handlers/protected/users.rs - /api/users handlers

use axum::extract::{Path, State};
use tracing::info;

use super::load_account;
use crate::api::ApiJson;
use crate::auth;
use crate::database::models::{User, UserId, UserProfileUpdate};
use crate::middleware::{ApiResponse, ApiResult, CurrentUser};
use crate::state::AppState;

/// GET /api/users/me
pub async fn me_get(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
) -> ApiResult<User> {
    Ok(ApiResponse::ok(load_account(&state, &principal).await?))
}

/// GET /api/users/:id
pub async fn user_get(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<UserId>,
) -> ApiResult<User> {
    let user = auth::guard(&principal, state.users.find_by_id(id).await?)?;
    Ok(ApiResponse::ok(user))
}

/// PUT /api/users/:id - update profile fields; absent fields are left alone
pub async fn user_put(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<UserId>,
    ApiJson(update): ApiJson<UserProfileUpdate>,
) -> ApiResult<User> {
    let user = auth::guard(&principal, state.users.find_by_id(id).await?)?;
    let updated = state
        .users
        .update_profile(user.id, update, state.clock.now())
        .await?;
    Ok(ApiResponse::ok(updated))
}

/// DELETE /api/users/:id - removes the account and everything it owns
pub async fn user_delete(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Path(id): Path<UserId>,
) -> ApiResult<()> {
    let user = auth::guard(&principal, state.users.find_by_id(id).await?)?;
    state.users.delete_user(user.id).await?;
    info!("Deleted user {} and owned records", user.id);
    Ok(ApiResponse::no_content())
}
