// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition plus service banner and liveness.

pub mod auth;

use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "name": "EdenMind API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Mood tracking, chatbot conversations, notifications and progress scoring",
        "endpoints": {
            "auth": "/api/auth/register, /api/auth/login (public)",
            "users": "/api/users/me, /api/users/:id (protected)",
            "emotions": "/api/emotions[/:id] (protected)",
            "conversations": "/api/conversations[/:id[/messages]] (protected)",
            "chat": "/api/chat/query, /api/chat/conversations (protected)",
            "notifications": "/api/notifications/* (protected)",
            "progress": "/api/progress (protected)"
        }
    }))
}

/// GET /health - liveness plus store connectivity
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let now = state.clock.now();

    match state.users.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                })),
            )
        }
    }
}
