//! Background jobs. Rows are written here and drained by an external worker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const EMAIL_JOB: &str = "email";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub name: String,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub name: String,
    pub data: serde_json::Value,
}

/// Payload of an `email` job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailJobData {
    /// Template id, e.g. `welcome` or `reset-password`.
    pub template: String,
    pub to: String,
    pub from: String,
    /// Deliver for real, or render a preview only.
    pub send: bool,
    pub locale: String,
    pub locals: serde_json::Value,
}

impl NewJob {
    pub fn email(data: &EmailJobData) -> Result<Self, serde_json::Error> {
        Ok(Self {
            name: EMAIL_JOB.to_string(),
            data: serde_json::to_value(data)?,
        })
    }
}
