//! Password reset token lifecycle.
//!
//! `none -> issued (expires T+30m) -> consumed | expired | reissued after expiry`.
//! A new token can only be issued once the previous one has expired or been
//! consumed, which limits reset emails to one per 30 minutes per account.

use chrono::{DateTime, Duration, Utc};

use super::service::AuthAppService;
use crate::models::{ResetTokenChange, UpdateUser, User};

pub const RESET_TOKEN_TTL_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReissueDecision {
    Allowed,
    /// An unexpired token exists; a new one may be requested at `retry_at`.
    Limited { retry_at: DateTime<Utc> },
}

/// Raw token for the email link plus the command that persists its digest.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub update: UpdateUser,
}

pub fn check_reissue(user: &User, now: DateTime<Utc>) -> ReissueDecision {
    match user.reset_token_expires_at {
        Some(retry_at) if user.has_active_reset_token(now) => {
            ReissueDecision::Limited { retry_at }
        }
        _ => ReissueDecision::Allowed,
    }
}

pub fn issue(now: DateTime<Utc>) -> IssuedToken {
    let token = AuthAppService::generate_token();
    let expires_at = now + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
    let update = UpdateUser {
        password_hash: None,
        reset_token: Some(ResetTokenChange::Issue {
            digest: AuthAppService::token_digest(&token),
            expires_at,
        }),
    };
    IssuedToken {
        token,
        expires_at,
        update,
    }
}

/// Consume the token and set the new password in one update.
pub fn consume(password_hash: String) -> UpdateUser {
    UpdateUser {
        password_hash: Some(password_hash),
        reset_token: Some(ResetTokenChange::Clear),
    }
}
