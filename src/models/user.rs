//! User accounts and the commands that change them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. The first account ever registered becomes `Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Admin,
    User,
}

impl Group {
    pub fn as_str(self) -> &'static str {
        match self {
            Group::Admin => "admin",
            Group::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Group::Admin),
            "user" => Some(Group::User),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub group: Group,
    /// SHA-256 hex digest of the outstanding reset token, never the token itself.
    #[serde(skip)]
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// A reset token exists and has not expired yet.
    pub fn has_active_reset_token(&self, now: DateTime<Utc>) -> bool {
        match (&self.reset_token, self.reset_token_expires_at) {
            (Some(_), Some(expires_at)) => expires_at > now,
            _ => false,
        }
    }
}

/// Attributes for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub group: Group,
}

/// Change to the reset token pair (`reset_token`, `reset_token_expires_at`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetTokenChange {
    Issue {
        digest: String,
        expires_at: DateTime<Utc>,
    },
    Clear,
}

/// Update command applied through [`crate::db::UserRepository::update`].
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateUser {
    pub password_hash: Option<String>,
    pub reset_token: Option<ResetTokenChange>,
}

impl UpdateUser {
    /// Apply the command to an in-memory copy of the user.
    pub fn apply_to(&self, user: &mut User, now: DateTime<Utc>) {
        if let Some(hash) = &self.password_hash {
            user.password_hash = hash.clone();
        }
        match &self.reset_token {
            Some(ResetTokenChange::Issue { digest, expires_at }) => {
                user.reset_token = Some(digest.clone());
                user.reset_token_expires_at = Some(*expires_at);
            }
            Some(ResetTokenChange::Clear) => {
                user.reset_token = None;
                user.reset_token_expires_at = None;
            }
            None => {}
        }
        user.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            password_hash: "hash".into(),
            group: Group::User,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn group_round_trips_through_text() {
        assert_eq!(Group::parse(Group::Admin.as_str()), Some(Group::Admin));
        assert_eq!(Group::parse("root"), None);
    }

    #[test]
    fn update_issues_and_clears_reset_token() {
        let now = Utc::now();
        let mut u = user();
        let expires_at = now + Duration::minutes(30);
        UpdateUser {
            reset_token: Some(ResetTokenChange::Issue {
                digest: "abc".into(),
                expires_at,
            }),
            ..Default::default()
        }
        .apply_to(&mut u, now);
        assert!(u.has_active_reset_token(now));
        assert!(!u.has_active_reset_token(expires_at));

        UpdateUser {
            password_hash: Some("new".into()),
            reset_token: Some(ResetTokenChange::Clear),
        }
        .apply_to(&mut u, now);
        assert_eq!(u.password_hash, "new");
        assert!(u.reset_token.is_none());
        assert!(u.reset_token_expires_at.is_none());
    }

    #[test]
    fn serialized_user_omits_secrets() {
        let json = serde_json::to_value(user()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("reset_token").is_none());
        assert_eq!(json["group"], "user");
    }
}
