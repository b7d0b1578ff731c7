//! Transactional email: builds `email` jobs and queues them best-effort.
//!
//! A failed enqueue is logged and swallowed. The action that triggered the
//! email (registration, reset token issuance) has already been committed and
//! its response must not change.

use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::Config;
use crate::db::JobQueue;
use crate::i18n::Locale;
use crate::models::{EmailJobData, NewJob, User};

pub const WELCOME_TEMPLATE: &str = "welcome";
pub const RESET_PASSWORD_TEMPLATE: &str = "reset-password";

#[derive(Clone)]
pub struct Mailer {
    jobs: Arc<dyn JobQueue>,
    from: String,
    send: bool,
    web_url: String,
}

impl Mailer {
    pub fn new(jobs: Arc<dyn JobQueue>, config: &Config) -> Self {
        Self {
            jobs,
            from: config.email.from.clone(),
            send: config.email.send,
            web_url: config.urls.web.clone(),
        }
    }

    /// Absolute link to the reset page for `token`.
    pub fn reset_link(&self, locale: &Locale, token: &str) -> String {
        format!("{}/{}/reset-password/{}", self.web_url, locale.as_str(), token)
    }

    pub async fn queue_welcome(&self, user: &User, locale: &Locale) {
        self.enqueue(EmailJobData {
            template: WELCOME_TEMPLATE.to_string(),
            to: user.email.clone(),
            from: self.from.clone(),
            send: self.send,
            locale: locale.as_str().to_string(),
            locals: json!({ "user": user }),
        })
        .await;
    }

    pub async fn queue_reset_password(&self, user: &User, token: &str, locale: &Locale) {
        self.enqueue(EmailJobData {
            template: RESET_PASSWORD_TEMPLATE.to_string(),
            to: user.email.clone(),
            from: self.from.clone(),
            send: self.send,
            locale: locale.as_str().to_string(),
            locals: json!({
                "user": {
                    "email": user.email,
                    "reset_token_expires_at": user.reset_token_expires_at,
                },
                "link": self.reset_link(locale, token),
            }),
        })
        .await;
    }

    async fn enqueue(&self, data: EmailJobData) {
        let job = match NewJob::email(&data) {
            Ok(job) => job,
            Err(e) => {
                error!(template = %data.template, error = %e, "failed to build email job");
                return;
            }
        };
        match self.jobs.create(job).await {
            Ok(job) => info!(job_id = %job.id, template = %data.template, "queued email"),
            Err(e) => error!(template = %data.template, error = %e, "failed to queue email"),
        }
    }
}
