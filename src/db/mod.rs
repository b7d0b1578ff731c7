//! Database layer: pool, store traits, PostgreSQL repositories and in-memory stores.

pub mod memory;
mod pool;
mod repositories;
mod store;

pub use pool::{create_pool, migrate, DbPool};
pub use repositories::*;
pub use store::{JobQueue, SessionStore, UserRepository};
