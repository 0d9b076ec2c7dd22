//! Ownership checks shared by every resource endpoint.
//!
//! Order is fixed: no principal is `Unauthenticated`, a missing record is
//! `NotFound` whoever asks, and only an existing record owned by someone else
//! is `Forbidden`.

use thiserror::Error;
use tracing::warn;

use super::{Principal, SecurityContext};
use crate::database::models::{Owned, ResourceKind, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessDenied {
    #[error("authentication required")]
    Unauthenticated,

    #[error("{0} not found")]
    NotFound(ResourceKind),

    #[error("access denied to {}", .0.noun())]
    Forbidden(ResourceKind),
}

pub fn authorize(acting: &Principal, owner_id: UserId) -> Decision {
    if acting.id == owner_id {
        Decision::Allow
    } else {
        Decision::Forbidden
    }
}

/// Step one: the request must carry a principal.
pub fn require(ctx: &SecurityContext) -> Result<&Principal, AccessDenied> {
    ctx.principal().ok_or(AccessDenied::Unauthenticated)
}

/// Steps two and three: locate, then check ownership.
pub fn guard<T: Owned>(acting: &Principal, found: Option<T>) -> Result<T, AccessDenied> {
    let resource = found.ok_or(AccessDenied::NotFound(T::KIND))?;

    match authorize(acting, resource.owner_id()) {
        Decision::Allow => Ok(resource),
        Decision::Forbidden => {
            warn!(
                "User {} denied access to {} owned by {}",
                acting.id,
                T::KIND.noun(),
                resource.owner_id()
            );
            Err(AccessDenied::Forbidden(T::KIND))
        }
    }
}
