//! Storage seams used by the auth flows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Group, Job, NewJob, NewUser, SessionData, UpdateUser, User};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<Option<User>>;

    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// User whose email and token digest both match and whose token expires after `now`.
    async fn find_by_reset_token(
        &self,
        email: &str,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>>;

    async fn count_by_group(&self, group: Group) -> AppResult<i64>;

    /// Fails with [`crate::AppError::DuplicateEmail`] when the email is taken.
    async fn register(&self, new_user: NewUser) -> AppResult<User>;

    async fn update(&self, id: Uuid, update: UpdateUser) -> AppResult<User>;
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn create(&self, job: NewJob) -> AppResult<Job>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> AppResult<Option<SessionData>>;
    async fn store(&self, id: &str, data: &SessionData, ttl: Duration) -> AppResult<()>;
    async fn destroy(&self, id: &str) -> AppResult<()>;
}
