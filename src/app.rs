use axum::{
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{Environment, SecurityConfig};
use crate::error::panic_response;
use crate::handlers::{protected, public};
use crate::middleware::authentication_gate;
use crate::state::AppState;

/// The full HTTP surface with the authentication gate in front of it.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security, state.config.environment);

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(auth_public_routes())
        // Protected (principal required per handler)
        .merge(user_routes())
        .merge(emotion_routes())
        .merge(conversation_routes())
        .merge(chat_routes())
        .merge(notification_routes())
        .route("/api/progress", get(protected::progress::progress_get))
        // Global middleware
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_gate,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

fn cors_layer(security: &SecurityConfig, environment: Environment) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if environment == Environment::Development {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/auth/register", post(auth::register_post))
        .route("/api/auth/login", post(auth::login_post))
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new()
        .route("/api/users/me", get(users::me_get))
        .route(
            "/api/users/:id",
            get(users::user_get)
                .put(users::user_put)
                .delete(users::user_delete),
        )
}

fn emotion_routes() -> Router<AppState> {
    use protected::emotions;

    Router::new()
        .route(
            "/api/emotions",
            get(emotions::emotions_get).post(emotions::emotion_post),
        )
        .route(
            "/api/emotions/:id",
            get(emotions::emotion_get).delete(emotions::emotion_delete),
        )
}

fn conversation_routes() -> Router<AppState> {
    use protected::conversations;

    Router::new()
        .route(
            "/api/conversations",
            get(conversations::conversations_get).post(conversations::conversation_post),
        )
        .route(
            "/api/conversations/:id",
            get(conversations::conversation_get).delete(conversations::conversation_delete),
        )
        .route(
            "/api/conversations/:id/messages",
            get(conversations::messages_get).post(conversations::message_post),
        )
}

fn chat_routes() -> Router<AppState> {
    use protected::{chat, conversations};

    Router::new()
        .route("/api/chat/query", post(chat::query_post))
        // Read-only aliases of the conversation endpoints
        .route("/api/chat/conversations", get(conversations::conversations_get))
        .route(
            "/api/chat/conversations/:id/messages",
            get(conversations::messages_get),
        )
}

fn notification_routes() -> Router<AppState> {
    use protected::notifications;

    Router::new()
        .route(
            "/api/notifications",
            get(notifications::notifications_get).post(notifications::notification_post),
        )
        .route(
            "/api/notifications/unread-count",
            get(notifications::unread_count_get),
        )
        .route("/api/notifications/read-all", put(notifications::read_all_put))
        .route(
            "/api/notifications/clear-all",
            delete(notifications::clear_all_delete),
        )
        .route(
            "/api/notifications/init-samples",
            post(notifications::init_samples_post),
        )
        .route("/api/notifications/events", post(notifications::event_post))
        .route("/api/notifications/:id/read", put(notifications::read_put))
        .route(
            "/api/notifications/:id",
            delete(notifications::notification_delete),
        )
}
