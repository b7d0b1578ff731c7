//! Repositories: users and jobs (PostgreSQL).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::{DbPool, JobQueue, UserRepository};
use crate::error::{AppError, AppResult};
use crate::models::{Group, Job, NewJob, NewUser, ResetTokenChange, UpdateUser, User};

const USER_COLUMNS: &str = "id, email, password_hash, user_group, reset_token, reset_token_expires_at, created_at, updated_at";

// ---- User ----

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub user_group: String,
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let group = Group::parse(&row.user_group).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("unknown user_group {:?}", row.user_group))
        })?;
        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            group,
            reset_token: row.reset_token,
            reset_token_expires_at: row.reset_token_expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

pub async fn user_create(pool: &DbPool, new_user: &NewUser) -> AppResult<UserRow> {
    let sql = format!(
        "INSERT INTO users (email, password_hash, user_group) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
    );
    sqlx::query_as::<_, UserRow>(&sql)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(new_user.group.as_str())
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEmail
            } else {
                AppError::Db(e)
            }
        })
}

pub async fn user_find_by_email(pool: &DbPool, email: &str) -> AppResult<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn user_get_by_id(pool: &DbPool, id: Uuid) -> AppResult<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn user_find_by_reset_token(
    pool: &DbPool,
    email: &str,
    token_digest: &str,
    now: DateTime<Utc>,
) -> AppResult<Option<UserRow>> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND reset_token = $2 AND reset_token_expires_at > $3"
    );
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(email)
        .bind(token_digest)
        .bind(now)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn users_count_by_group(pool: &DbPool, group: Group) -> AppResult<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*)::bigint FROM users WHERE user_group = $1")
        .bind(group.as_str())
        .fetch_one(pool)
        .await?;
    Ok(count.0)
}

pub async fn user_update(pool: &DbPool, id: Uuid, update: &UpdateUser) -> AppResult<UserRow> {
    let (touch_token, digest, expires_at) = match &update.reset_token {
        Some(ResetTokenChange::Issue { digest, expires_at }) => {
            (true, Some(digest.as_str()), Some(*expires_at))
        }
        Some(ResetTokenChange::Clear) => (true, None, None),
        None => (false, None, None),
    };
    let sql = format!(
        r#"
        UPDATE users SET
            password_hash = COALESCE($2, password_hash),
            reset_token = CASE WHEN $3 THEN $4 ELSE reset_token END,
            reset_token_expires_at = CASE WHEN $3 THEN $5 ELSE reset_token_expires_at END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .bind(update.password_hash.as_deref())
        .bind(touch_token)
        .bind(digest)
        .bind(expires_at)
        .fetch_optional(pool)
        .await?;
    row.ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// [`UserRepository`] over PostgreSQL.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: DbPool,
}

impl PgUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn get(&self, id: Uuid) -> AppResult<Option<User>> {
        user_get_by_id(&self.pool, id).await?.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        user_find_by_email(&self.pool, email)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_reset_token(
        &self,
        email: &str,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<User>> {
        user_find_by_reset_token(&self.pool, email, token_digest, now)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn count_by_group(&self, group: Group) -> AppResult<i64> {
        users_count_by_group(&self.pool, group).await
    }

    async fn register(&self, new_user: NewUser) -> AppResult<User> {
        user_create(&self.pool, &new_user).await?.try_into()
    }

    async fn update(&self, id: Uuid, update: UpdateUser) -> AppResult<User> {
        user_update(&self.pool, id, &update).await?.try_into()
    }
}

// ---- Jobs ----

#[derive(Debug, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub name: String,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

pub async fn job_create(pool: &DbPool, job: &NewJob) -> AppResult<JobRow> {
    let row = sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO jobs (name, data)
        VALUES ($1, $2)
        RETURNING id, name, data, created_at
        "#,
    )
    .bind(&job.name)
    .bind(&job.data)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// [`JobQueue`] backed by the `jobs` table.
#[derive(Clone)]
pub struct PgJobQueue {
    pool: DbPool,
}

impl PgJobQueue {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobQueue for PgJobQueue {
    async fn create(&self, job: NewJob) -> AppResult<Job> {
        let row = job_create(&self.pool, &job).await?;
        Ok(Job {
            id: row.id,
            name: row.name,
            data: row.data,
            created_at: row.created_at,
        })
    }
}
