use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::auth::{self, Principal, SecurityContext, TokenCodec, TokenError};
use crate::clock::Clock;
use crate::database::UserStore;
use crate::error::ApiError;
use crate::state::AppState;

/// What the gate did with one request.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    NoHeader,
    MalformedHeader,
    DecodeFailed(TokenError),
    AlreadyAuthenticated,
    Authenticated(Principal),
    Rejected(&'static str),
}

/// Resolves a bearer token into a principal for the current request.
///
/// Never fails: anything short of a valid, unexpired token for an existing
/// account leaves the context anonymous and lets the handler decide.
#[derive(Clone)]
pub struct AuthenticationGate {
    codec: TokenCodec,
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
}

impl AuthenticationGate {
    pub fn new(codec: TokenCodec, users: Arc<dyn UserStore>, clock: Arc<dyn Clock>) -> Self {
        Self { codec, users, clock }
    }

    pub async fn process(
        &self,
        header: Option<&HeaderValue>,
        mut ctx: SecurityContext,
    ) -> (SecurityContext, GateOutcome) {
        let Some(header) = header else {
            return (ctx, GateOutcome::NoHeader);
        };
        let Some(token) = bearer_token(header) else {
            return (ctx, GateOutcome::MalformedHeader);
        };

        let decoded = match self.codec.decode(token) {
            Ok(decoded) => decoded,
            Err(e) => return (ctx, GateOutcome::DecodeFailed(e)),
        };

        if ctx.is_authenticated() {
            return (ctx, GateOutcome::AlreadyAuthenticated);
        }

        let user = match self.users.find_by_email(&decoded.subject).await {
            Ok(Some(user)) => user,
            Ok(None) => return (ctx, GateOutcome::Rejected("unknown subject")),
            Err(e) => {
                warn!("User lookup failed during authentication: {}", e);
                return (ctx, GateOutcome::Rejected("user lookup failed"));
            }
        };

        match self.codec.validate(token, &user.email, self.clock.now()) {
            Ok(true) => {
                let principal = Principal::from(&user);
                ctx.authenticate(principal.clone());
                (ctx, GateOutcome::Authenticated(principal))
            }
            Ok(false) => (ctx, GateOutcome::Rejected("subject mismatch")),
            Err(TokenError::Expired { .. }) => (ctx, GateOutcome::Rejected("token expired")),
            Err(e) => (ctx, GateOutcome::DecodeFailed(e)),
        }
    }
}

fn bearer_token(header: &HeaderValue) -> Option<&str> {
    let value = header.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Runs the gate for every request and stores the resulting context in the
/// request extensions.
pub async fn authentication_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let ctx = request
        .extensions_mut()
        .remove::<SecurityContext>()
        .unwrap_or_default();

    let (ctx, outcome) = state
        .gate
        .process(request.headers().get(AUTHORIZATION), ctx)
        .await;

    match &outcome {
        GateOutcome::Authenticated(principal) => {
            debug!("Authenticated user {} ({})", principal.id, principal.email)
        }
        GateOutcome::DecodeFailed(TokenError::InvalidSignature) => {
            warn!("Rejected token with invalid signature for {}", request.uri().path())
        }
        GateOutcome::DecodeFailed(e) => debug!("Ignoring undecodable token: {}", e),
        GateOutcome::Rejected(reason) => debug!("Ignoring token: {}", reason),
        GateOutcome::NoHeader | GateOutcome::MalformedHeader => {
            debug!("Anonymous request to {}", request.uri().path())
        }
        GateOutcome::AlreadyAuthenticated => {}
    }

    request.extensions_mut().insert(ctx);
    next.run(request).await
}

/// The authenticated principal, or a 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let anonymous = SecurityContext::anonymous();
        let ctx = parts
            .extensions
            .get::<SecurityContext>()
            .unwrap_or(&anonymous);
        let principal = auth::require(ctx)?;
        Ok(CurrentUser(principal.clone()))
    }
}
