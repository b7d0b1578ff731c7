//! Server-side session payload.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// Authenticated user, if any.
    #[serde(default)]
    pub user_id: Option<Uuid>,
    /// Where to send the user after login or signup. Same-origin only.
    #[serde(default, rename = "returnTo")]
    pub return_to: Option<String>,
    #[serde(default)]
    pub flash: Vec<Flash>,
}
