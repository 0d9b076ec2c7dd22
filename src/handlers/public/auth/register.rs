// handlers/public/auth/register.rs - POST /api/auth/register handler

use axum::extract::State;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;

use super::{issue_for, TokenResponse};
use crate::api::ApiJson;
use crate::auth::hash_password;
use crate::database::models::NewUser;
use crate::database::StoreError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl RegisterRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let mut errors = HashMap::new();

        if !is_plausible_email(self.email.trim()) {
            errors.insert("email".to_string(), "A valid email address is required".to_string());
        }
        if self.password.is_empty() {
            errors.insert("password".to_string(), "Password is required".to_string());
        }
        if self.first_name.trim().is_empty() {
            errors.insert("firstName".to_string(), "First name is required".to_string());
        }
        if self.last_name.trim().is_empty() {
            errors.insert("lastName".to_string(), "Last name is required".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("Invalid registration data", Some(errors)))
        }
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// POST /api/auth/register - create an account and return its first token
///
/// An already registered email is a 400, not a 409.
pub async fn register_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<TokenResponse> {
    payload.validate()?;
    let email = payload.email.trim().to_string();

    if state.users.exists_by_email(&email).await? {
        return Err(ApiError::bad_request("Email is already registered"));
    }

    let created = state
        .users
        .create_user(NewUser {
            email,
            password_hash: hash_password(&payload.password)?,
            first_name: payload.first_name.trim().to_string(),
            last_name: payload.last_name.trim().to_string(),
            created_at: state.clock.now(),
        })
        .await;

    let user = match created {
        Ok(user) => user,
        // lost a race with a concurrent registration
        Err(StoreError::Conflict(_)) => {
            return Err(ApiError::bad_request("Email is already registered"))
        }
        Err(e) => return Err(e.into()),
    };

    info!("Registered user {}", user.id);
    Ok(ApiResponse::ok(issue_for(&state, &user)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_is_checked() {
        assert!(is_plausible_email("ada@example.com"));
        assert!(!is_plausible_email("ada.example.com"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("ada@"));
        assert!(!is_plausible_email("a@b@c"));
    }

    #[test]
    fn missing_fields_are_reported_per_field() {
        let req = RegisterRequest {
            email: "nope".to_string(),
            password: String::new(),
            first_name: "Ada".to_string(),
            last_name: " ".to_string(),
        };
        match req.validate() {
            Err(ApiError::ValidationError { field_errors: Some(fields), .. }) => {
                assert!(fields.contains_key("email"));
                assert!(fields.contains_key("password"));
                assert!(fields.contains_key("lastName"));
                assert!(!fields.contains_key("firstName"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
