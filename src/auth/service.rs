//! Auth application service: password hash/verify, input checks, opaque tokens.

use crate::error::{AppError, AppResult};
use argon2::{
    password_hash::{
        rand_core::{OsRng, RngCore},
        PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Argon2,
};
use sha2::{Digest, Sha256};
use validator::ValidateEmail;

pub struct AuthAppService;

impl AuthAppService {
    pub fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hash: {}", e)))?
            .to_string();
        Ok(hash)
    }

    pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
        let parsed =
            PasswordHash::new(hash).map_err(|e| AppError::Internal(anyhow::anyhow!("parse hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Trimmed, lower-cased form used for storage and lookups.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    pub fn is_valid_email(email: &str) -> bool {
        email.validate_email()
    }

    pub fn is_blank(value: &str) -> bool {
        value.trim().is_empty()
    }

    pub fn is_strong_password(password: &str, min_length: usize) -> bool {
        password.chars().count() >= min_length
    }

    /// 32 random bytes, hex encoded. Used for session ids and reset tokens.
    pub fn generate_token() -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Digest stored in place of a raw token.
    pub fn token_digest(token: &str) -> String {
        hex::encode(Sha256::digest(token.as_bytes()))
    }
}
