//! Session extractor: signed cookie -> server-side [`SessionData`].

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::auth::AuthAppService;
use crate::db::SessionStore;
use crate::error::{AppError, AppResult};
use crate::handlers::http::AppState;
use crate::models::{Flash, FlashKind, SessionData};
use crate::services::CookieSigner;

pub const SESSION_COOKIE: &str = "portal.sid";

/// The current request's session. Changes are persisted by [`Session::commit`].
pub struct Session {
    id: String,
    /// Id to destroy on commit after [`Session::renew`].
    stale_id: Option<String>,
    /// No stored session backed this request.
    fresh: bool,
    data: SessionData,
    store: Arc<dyn SessionStore>,
    signer: CookieSigner,
    ttl: Duration,
    secure: bool,
}

impl Session {
    pub fn data(&self) -> &SessionData {
        &self.data
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.data.user_id
    }

    /// Establish identity under a fresh session id.
    pub fn log_in(&mut self, user_id: Uuid) {
        self.renew();
        self.data.user_id = Some(user_id);
    }

    pub fn log_out(&mut self) {
        self.data.user_id = None;
    }

    pub fn set_return_to(&mut self, target: Option<String>) {
        self.data.return_to = target;
    }

    /// Consume the stored return target.
    pub fn take_return_to(&mut self) -> Option<String> {
        self.data.return_to.take()
    }

    pub fn flash(&mut self, kind: FlashKind, message: String) {
        self.data.flash.push(Flash { kind, message });
    }

    pub fn take_flash(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.data.flash)
    }

    fn renew(&mut self) {
        let old = std::mem::replace(&mut self.id, AuthAppService::generate_token());
        if self.stale_id.is_none() {
            self.stale_id = Some(old);
        }
    }

    /// Persist the session and return the cookie jar carrying its id.
    ///
    /// A fresh session that is still empty is neither stored nor sent.
    pub async fn commit(self) -> AppResult<CookieJar> {
        if self.fresh && self.stale_id.is_none() && self.data == SessionData::default() {
            return Ok(CookieJar::new());
        }
        if let Some(stale) = &self.stale_id {
            self.store.destroy(stale).await?;
        }
        self.store.store(&self.id, &self.data, self.ttl).await?;
        let cookie = Cookie::build((SESSION_COOKIE, self.signer.sign(&self.id)?))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure);
        Ok(CookieJar::new().add(cookie))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let existing = jar
            .get(SESSION_COOKIE)
            .and_then(|c| state.signer.unsign(c.value()));

        let loaded = match existing {
            Some(id) => state.sessions.load(&id).await?.map(|data| (id, data)),
            None => None,
        };
        let fresh = loaded.is_none();
        let (id, data) = match loaded {
            Some(found) => found,
            None => {
                debug!("starting new session");
                (AuthAppService::generate_token(), SessionData::default())
            }
        };

        Ok(Session {
            id,
            stale_id: None,
            fresh,
            data,
            store: state.sessions.clone(),
            signer: state.signer.clone(),
            ttl: state.config.session.ttl,
            secure: state.config.session.cookie_secure,
        })
    }
}
