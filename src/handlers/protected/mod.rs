// handlers/protected/mod.rs - Protected handlers (principal required)
//
// Every handler takes `CurrentUser`, which is a 401 when the gate left the
// request anonymous. Handlers that address a single record then go through
// `auth::guard`, so a missing record is a 404 before ownership is checked,
// and a record owned by someone else is a 403.

pub mod chat;
pub mod conversations;
pub mod emotions;
pub mod notifications;
pub mod progress;
pub mod users;

use crate::auth::Principal;
use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

/// Full account row for the acting principal.
pub(crate) async fn load_account(state: &AppState, principal: &Principal) -> Result<User, ApiError> {
    state
        .users
        .find_by_id(principal.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))
}
