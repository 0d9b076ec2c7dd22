// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::extract::State;
use serde::Deserialize;
use tracing::{info, warn};

use super::{issue_for, TokenResponse};
use crate::api::ApiJson;
use crate::auth::verify_password;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/auth/login - exchange credentials for a token
///
/// Unknown email and wrong password are indistinguishable: both are 401
/// "Invalid credentials".
pub async fn login_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let email = payload.email.trim();

    let Some(user) = state.users.find_by_email(email).await? else {
        warn!("Login attempt for unknown account");
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!("Login attempt with wrong password for user {}", user.id);
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    info!("User {} logged in", user.id);
    Ok(ApiResponse::ok(issue_for(&state, &user)?))
}
