// HTTP API Error Types
use axum::{extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut body = match self {
            ApiError::ValidationError { message, field_errors } => {
                let mut response = json!({
                    "error": true,
                    "message": message,
                    "code": "VALIDATION_ERROR"
                });

                if let Some(field_errors) = field_errors {
                    response["field_errors"] = json!(field_errors);
                }

                response
            }
            _ => {
                json!({
                    "error": true,
                    "message": self.message(),
                    "code": self.error_code()
                })
            }
        };

        // Server-side failures always carry a timestamp so they share the
        // fallback handler's shape.
        if self.status_code() >= 500 {
            body["timestamp"] = json!(chrono::Utc::now());
        }

        body
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

// Convert other error types to ApiError
impl From<crate::database::StoreError> for ApiError {
    fn from(err: crate::database::StoreError) -> Self {
        match err {
            crate::database::StoreError::NotFound(msg) => ApiError::not_found(msg),
            crate::database::StoreError::Conflict(msg) => ApiError::conflict(msg),
            other => {
                tracing::error!("Store error: {}", other);
                ApiError::internal_server_error(other.to_string())
            }
        }
    }
}

impl From<crate::auth::AccessDenied> for ApiError {
    fn from(err: crate::auth::AccessDenied) -> Self {
        use crate::auth::AccessDenied;
        match err {
            AccessDenied::Unauthenticated => ApiError::unauthorized("Authentication required"),
            AccessDenied::NotFound(kind) => ApiError::not_found(format!("{} not found", kind)),
            AccessDenied::Forbidden(kind) => {
                ApiError::forbidden(format!("Access denied to {}", kind.noun()))
            }
        }
    }
}

impl From<crate::services::ProgressError> for ApiError {
    fn from(err: crate::services::ProgressError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<crate::services::AskError> for ApiError {
    fn from(err: crate::services::AskError) -> Self {
        tracing::error!("Ask service failure: {}", err);
        ApiError::internal_server_error(err.to_string())
    }
}

impl From<crate::services::ChatError> for ApiError {
    fn from(err: crate::services::ChatError) -> Self {
        use crate::services::ChatError;
        match err {
            ChatError::EmptyQuery => ApiError::bad_request("Query cannot be empty"),
            ChatError::Access(e) => e.into(),
            ChatError::Store(e) => e.into(),
            ChatError::Ask(e) => e.into(),
        }
    }
}

impl From<crate::auth::TokenError> for ApiError {
    fn from(err: crate::auth::TokenError) -> Self {
        tracing::error!("Token issuance failure: {}", err);
        ApiError::internal_server_error(err.to_string())
    }
}

impl From<crate::auth::PasswordError> for ApiError {
    fn from(err: crate::auth::PasswordError) -> Self {
        tracing::error!("Password hashing failure: {}", err);
        ApiError::internal_server_error("Failed to process credentials")
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_json(rejection.body_text())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

/// Last-resort body for panics escaping a handler.
pub fn panic_response(
    err: Box<dyn std::any::Any + Send + 'static>,
) -> axum::response::Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };
    tracing::error!("Handler panicked: {}", message);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "timestamp": chrono::Utc::now(),
            "message": message,
            "error": "Internal Server Error"
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_have_no_timestamp() {
        let body = ApiError::not_found("Conversation not found").to_json();
        assert_eq!(body["code"], "NOT_FOUND");
        assert!(body.get("timestamp").is_none());
    }

    #[test]
    fn server_errors_carry_timestamp_and_message() {
        let err = ApiError::internal_server_error("upstream exploded");
        let body = err.to_json();
        assert_eq!(err.status_code(), 500);
        assert_eq!(body["message"], "upstream exploded");
        assert!(body.get("timestamp").is_some());
    }

    #[test]
    fn store_outages_surface_the_driver_message() {
        let err: ApiError =
            crate::database::StoreError::Unavailable("connection refused".to_string()).into();
        let body = err.to_json();
        assert_eq!(err.status_code(), 500);
        assert!(body["message"].as_str().unwrap().contains("connection refused"));
        assert!(body.get("timestamp").is_some());

        let conflict: ApiError =
            crate::database::StoreError::Conflict("Email taken".to_string()).into();
        assert_eq!(conflict.status_code(), 409);
    }

    #[test]
    fn access_denied_maps_to_documented_statuses() {
        use crate::auth::AccessDenied;
        use crate::database::ResourceKind;

        let forbidden: ApiError = AccessDenied::Forbidden(ResourceKind::Conversation).into();
        assert_eq!(forbidden.status_code(), 403);
        assert!(forbidden.message().contains("Access denied"));

        let missing: ApiError = AccessDenied::NotFound(ResourceKind::Notification).into();
        assert_eq!(missing.status_code(), 404);

        let anon: ApiError = AccessDenied::Unauthenticated.into();
        assert_eq!(anon.status_code(), 401);
    }
}
