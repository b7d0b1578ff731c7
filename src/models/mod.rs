//! Data models for users, background jobs, and sessions.

pub mod job;
pub mod session;
pub mod user;

pub use job::*;
pub use session::*;
pub use user::*;
