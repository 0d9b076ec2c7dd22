pub mod access;
pub mod password;
pub mod token;

pub use access::{authorize, guard, require, AccessDenied, Decision};
pub use password::{hash_password, verify_password, PasswordError};
pub use token::{Claims, DecodedToken, TokenCodec, TokenError};

use chrono::{DateTime, Utc};

use crate::database::models::{User, UserId};

/// The identity resolved for the current request.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            created_at: user.created_at,
        }
    }
}

/// Per-request authentication state. Starts anonymous and is set at most once.
#[derive(Debug, Clone, Default)]
pub struct SecurityContext {
    principal: Option<Principal>,
}

impl SecurityContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Install `principal` unless one is already present. Returns whether it
    /// was installed.
    pub fn authenticate(&mut self, principal: Principal) -> bool {
        if self.principal.is_some() {
            return false;
        }
        self.principal = Some(principal);
        true
    }
}
