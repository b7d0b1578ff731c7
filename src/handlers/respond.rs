//! Content negotiation: JSON bodies for API clients, flash + redirect for browsers.

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::convert::Infallible;
use tracing::{debug, warn};

use crate::error::{AppError, AppResult};
use crate::middleware::Session;
use crate::models::FlashKind;

const MAX_BODY_BYTES: usize = 64 * 1024;

/// What the client accepts, plus the `Referer` for "redirect back".
#[derive(Debug, Clone, Default)]
pub struct Accepts {
    pub json: bool,
    pub referer: Option<String>,
}

impl Accepts {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let accept = headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let xhr = headers
            .get("x-requested-with")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("xmlhttprequest"));
        let json = xhr
            || accept
                .split(',')
                .map(|part| part.split(';').next().unwrap_or("").trim())
                .any(|media| media.eq_ignore_ascii_case("application/json"));
        let referer = headers
            .get(header::REFERER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Self { json, referer }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Accepts
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// Body parsed from JSON or an urlencoded form, depending on `Content-Type`.
/// An empty body yields `T::default()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormOrJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for FormOrJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));
        let (parts, body) = req.into_parts();
        let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid body: {}", e)))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        let req = Request::from_parts(parts, Body::from(bytes));
        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self(value))
        }
    }
}

/// Successful outcome of an auth action.
#[derive(Debug, Clone)]
pub struct Reply {
    pub message: String,
    pub redirect_to: String,
    /// Browser destination when `redirect_to` cannot be sent as a `Location`.
    pub fallback: String,
    /// Included in JSON only when set (`login` sets it).
    pub auto_redirect: Option<bool>,
    /// JSON carries only `message`, as for "redirect back" responses.
    pub message_only: bool,
}

impl Reply {
    /// Send the client to `target`, or to `default` when there is none.
    pub fn redirect(message: String, target: Option<String>, default: String) -> Self {
        Self {
            message,
            redirect_to: target.unwrap_or_else(|| default.clone()),
            fallback: default,
            auto_redirect: None,
            message_only: false,
        }
    }

    pub fn auto_redirect(mut self) -> Self {
        self.auto_redirect = Some(true);
        self
    }

    /// Browser goes back to the referring page (or `fallback`).
    pub fn back(message: String, accepts: &Accepts, fallback: String) -> Self {
        Self {
            message,
            redirect_to: accepts.referer.clone().unwrap_or_else(|| fallback.clone()),
            fallback,
            auto_redirect: None,
            message_only: true,
        }
    }
}

/// `303 See Other` to `target`. Targets that are not valid header values
/// fall back to `fallback`, then to `/`.
pub fn see_other(target: &str, fallback: &str) -> Response {
    let location = HeaderValue::try_from(target)
        .or_else(|_| {
            warn!(location = target, fallback, "unusable redirect target");
            HeaderValue::try_from(fallback)
        })
        .unwrap_or_else(|_| HeaderValue::from_static("/"));
    (StatusCode::SEE_OTHER, [(header::LOCATION, location)]).into_response()
}

/// Flash (browsers only), commit the session, and build the response.
pub async fn finish(mut session: Session, accepts: &Accepts, reply: Reply) -> AppResult<Response> {
    if accepts.json {
        let body = if reply.message_only {
            json!({ "message": reply.message })
        } else if let Some(auto) = reply.auto_redirect {
            json!({ "message": reply.message, "redirectTo": reply.redirect_to, "autoRedirect": auto })
        } else {
            json!({ "message": reply.message, "redirectTo": reply.redirect_to })
        };
        let jar = session.commit().await?;
        Ok((jar, Json(body)).into_response())
    } else {
        session.flash(FlashKind::Success, reply.message);
        let jar = session.commit().await?;
        Ok((jar, see_other(&reply.redirect_to, &reply.fallback)).into_response())
    }
}

/// Like [`finish`], but client errors from browsers become an error flash and a
/// redirect back to the referring page (or `back_to`). JSON clients and server
/// errors get the error response.
pub async fn respond(
    mut session: Session,
    accepts: &Accepts,
    outcome: AppResult<Reply>,
    back_to: String,
) -> AppResult<Response> {
    match outcome {
        Ok(reply) => finish(session, accepts, reply).await,
        Err(e) if accepts.json || e.status().is_server_error() => Err(e),
        Err(e) => {
            debug!(error = %e, "flashing client error");
            session.flash(FlashKind::Error, e.public_message());
            let target = accepts.referer.clone().unwrap_or_else(|| back_to.clone());
            let jar = session.commit().await?;
            Ok((jar, see_other(&target, &back_to)).into_response())
        }
    }
}
