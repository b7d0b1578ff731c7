//! HTTP handlers: application state, health, home page.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::auth::CredentialVerifier;
use crate::config::Config;
use crate::db::{SessionStore, UserRepository};
use crate::error::AppResult;
use crate::i18n::Locale;
use crate::middleware::Session;
use crate::services::{CookieSigner, Mailer};
use crate::views::{self, PageContext};

/// Shared application state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionStore>,
    pub credentials: Arc<dyn CredentialVerifier>,
    pub mailer: Mailer,
    pub signer: CookieSigner,
}

impl AppState {
    pub fn config(&self) -> &Config {
        &self.config
    }
    pub fn users(&self) -> &dyn UserRepository {
        self.users.as_ref()
    }
    pub fn mailer(&self) -> &Mailer {
        &self.mailer
    }
}

/// Render a page with the session's pending flash messages, then commit the session.
pub async fn render_page<F>(
    state: &AppState,
    locale: &Locale,
    mut session: Session,
    render: F,
) -> AppResult<Response>
where
    F: FnOnce(&PageContext<'_>) -> String,
{
    let signed_in_as = match session.user_id() {
        Some(id) => state.users().get(id).await?.map(|u| u.email),
        None => None,
    };
    let ctx = PageContext {
        config: state.config(),
        locale,
        flash: session.take_flash(),
        signed_in_as,
    };
    let html = render(&ctx);
    let jar = session.commit().await?;
    Ok((jar, Html(html)).into_response())
}

/// GET /: send visitors to the default locale.
pub async fn root(State(state): State<AppState>) -> Redirect {
    Redirect::to(&format!("/{}", state.config().i18n.default_locale))
}

/// GET /:locale
pub async fn home(
    State(state): State<AppState>,
    locale: Locale,
    session: Session,
) -> AppResult<Response> {
    render_page(&state, &locale, session, views::home).await
}

/// GET /health: liveness probe.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "portal" })),
    )
}
