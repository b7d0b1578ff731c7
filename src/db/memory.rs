//! In-process stores for tests and `APP_ENV=test` runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{JobQueue, SessionStore, UserRepository};
use crate::error::{AppError, AppResult};
use crate::models::{Group, Job, NewJob, NewUser, SessionData, UpdateUser, User};

#[derive(Default)]
pub struct MemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<User> {
        self.users.read().await.clone()
    }

    /// Move a user's token expiry, e.g. to simulate the 30-minute window passing.
    pub async fn set_reset_token_expiry(&self, email: &str, expires_at: DateTime<Utc>) -> bool {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                user.reset_token_expires_at = Some(expires_at);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn get(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_reset_token(
        &self,
        email: &str,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| {
                u.email == email
                    && u.reset_token.as_deref() == Some(token_digest)
                    && u.reset_token_expires_at.is_some_and(|exp| exp > now)
            })
            .cloned())
    }

    async fn count_by_group(&self, group: Group) -> AppResult<i64> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .filter(|u| u.group == group)
            .count() as i64)
    }

    async fn register(&self, new_user: NewUser) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::DuplicateEmail);
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            group: new_user.group,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, update: UpdateUser) -> AppResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        update.apply_to(user, Utc::now());
        Ok(user.clone())
    }
}

/// Job queue that keeps jobs in a vector. Can be switched to failing mode.
#[derive(Default)]
pub struct MemoryJobQueue {
    jobs: RwLock<Vec<Job>>,
    failing: AtomicBool,
}

impl MemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn jobs(&self) -> Vec<Job> {
        self.jobs.read().await.clone()
    }

    /// Make every subsequent `create` fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn create(&self, job: NewJob) -> AppResult<Job> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal(anyhow::anyhow!("job queue unavailable")));
        }
        let job = Job {
            id: Uuid::new_v4(),
            name: job.name,
            data: job.data,
            created_at: Utc::now(),
        };
        self.jobs.write().await.push(job.clone());
        Ok(job)
    }
}

/// Session store without expiry; TTLs are ignored.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionData>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> AppResult<Option<SessionData>> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn store(&self, id: &str, data: &SessionData, _ttl: Duration) -> AppResult<()> {
        self.sessions
            .write()
            .await
            .insert(id.to_string(), data.clone());
        Ok(())
    }

    async fn destroy(&self, id: &str) -> AppResult<()> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}
