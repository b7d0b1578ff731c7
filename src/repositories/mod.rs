//! External-service repositories.

pub mod redis_repo;

pub use redis_repo::RedisSessionStore;
