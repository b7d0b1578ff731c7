//! Credential verification used by the login handler.

use async_trait::async_trait;
use std::sync::Arc;

use super::service::AuthAppService;
use crate::db::UserRepository;
use crate::error::AppError;
use crate::i18n::Phrase;
use crate::models::User;

/// Why a login attempt was refused.
#[derive(Debug)]
pub enum AuthFailure {
    MissingCredentials,
    /// Unknown email or wrong password; the two are not distinguished.
    InvalidCredentials,
    Backend(AppError),
}

impl AuthFailure {
    /// Message key for client-facing failures; `None` for backend errors.
    pub fn phrase(&self) -> Option<Phrase> {
        match self {
            AuthFailure::MissingCredentials => Some(Phrase::MissingCredentials),
            AuthFailure::InvalidCredentials => Some(Phrase::InvalidCredentials),
            AuthFailure::Backend(_) => None,
        }
    }
}

impl From<AppError> for AuthFailure {
    fn from(e: AppError) -> Self {
        AuthFailure::Backend(e)
    }
}

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, email: &str, password: &str) -> Result<User, AuthFailure>;
}

/// Email + argon2 password check against the user store.
#[derive(Clone)]
pub struct PasswordVerifier {
    users: Arc<dyn UserRepository>,
}

impl PasswordVerifier {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl CredentialVerifier for PasswordVerifier {
    async fn verify(&self, email: &str, password: &str) -> Result<User, AuthFailure> {
        if AuthAppService::is_blank(email) || password.is_empty() {
            return Err(AuthFailure::MissingCredentials);
        }
        let email = AuthAppService::normalize_email(email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthFailure::InvalidCredentials)?;
        if !AuthAppService::verify_password(password, &user.password_hash)? {
            return Err(AuthFailure::InvalidCredentials);
        }
        Ok(user)
    }
}
