pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use models::{Owned, ResourceKind, UserId, USER_DELETION_PLAN};
pub use postgres::PgStore;
pub use store::{ResourceStore, Store, StoreError, UserStore};
