// handlers/public/auth/mod.rs - Public authentication handlers
//
// Both endpoints answer with `{ "token": "..." }`; the token's subject is the
// account email and it carries firstName, lastName and createdAt claims.

pub mod login; // POST /api/auth/login
pub mod register; // POST /api/auth/register

pub use login::login_post;
pub use register::register_post;

use serde::Serialize;

use crate::auth::TokenError;
use crate::database::models::User;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub(crate) fn issue_for(state: &AppState, user: &User) -> Result<TokenResponse, TokenError> {
    let token = state.codec.issue(
        &user.email,
        user.profile_claims(),
        state.clock.now(),
        state.codec.ttl(),
    )?;
    Ok(TokenResponse { token })
}
