pub mod auth;
pub mod response;

pub use auth::{authentication_gate, AuthenticationGate, CurrentUser, GateOutcome};
pub use response::{ApiResponse, ApiResult};
