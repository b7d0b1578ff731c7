//! Request extractors shared by the HTTP handlers.

pub mod session;

pub use session::{Session, SESSION_COOKIE};
