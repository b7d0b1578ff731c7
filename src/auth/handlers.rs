//! Auth HTTP handlers: logout, signup/login pages, login, register,
//! forgot-password and reset-password.

use axum::{
    extract::{OriginalUri, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use super::redirect::{is_safe_return_to, requested_return_to};
use super::reset::{self, ReissueDecision};
use super::{AuthAppService, AuthFailure};
use crate::error::{AppError, AppResult};
use crate::handlers::http::{render_page, AppState};
use crate::handlers::{respond, Accepts, FormOrJson, Reply};
use crate::i18n::{Locale, Phrase};
use crate::middleware::Session;
use crate::models::{Group, NewUser};
use crate::views;

#[derive(Debug, Default, Deserialize)]
pub struct ReturnToQuery {
    pub return_to: Option<String>,
    pub redirect_to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl RegisterRequest {
    fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Normalized email, or `INVALID_EMAIL`.
fn require_email(locale: &Locale, email: Option<&str>) -> AppResult<String> {
    let email = AuthAppService::normalize_email(email.unwrap_or(""));
    if !AuthAppService::is_valid_email(&email) {
        return Err(AppError::BadRequest(locale.t(Phrase::InvalidEmail)));
    }
    Ok(email)
}

/// Non-blank password, or `INVALID_PASSWORD`.
fn require_password<'a>(locale: &Locale, password: Option<&'a str>) -> AppResult<&'a str> {
    match password {
        Some(p) if !AuthAppService::is_blank(p) => Ok(p),
        _ => Err(AppError::BadRequest(locale.t(Phrase::InvalidPassword))),
    }
}

fn require_strength(state: &AppState, locale: &Locale, password: &str) -> AppResult<()> {
    if !AuthAppService::is_strong_password(password, state.config().auth.password_min_length) {
        return Err(AppError::BadRequest(locale.t(Phrase::InvalidPasswordStrength)));
    }
    Ok(())
}

/// GET /:locale/logout
pub async fn logout(locale: Locale, mut session: Session) -> AppResult<Response> {
    session.log_out();
    let jar = session.commit().await?;
    Ok((jar, Redirect::to(&locale.root())).into_response())
}

/// GET /:locale/signup and GET /:locale/login
pub async fn signup_or_login(
    State(state): State<AppState>,
    locale: Locale,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<ReturnToQuery>,
    mut session: Session,
) -> AppResult<Response> {
    if let Some(target) =
        requested_return_to(query.return_to.as_deref(), query.redirect_to.as_deref())
    {
        session.set_return_to(Some(target));
    }

    if let Some(target) = session.data().return_to.clone() {
        if !is_safe_return_to(&target, &state.config().urls.web) {
            warn!(return_to = %target, "prevented abuse with returnTo hijacking");
            session.set_return_to(None);
        }
    }

    let signup = uri.path().trim_end_matches('/').ends_with("/signup");
    render_page(&state, &locale, session, |ctx| views::signup_or_login(ctx, signup)).await
}

/// Stored return target, re-checked against the web origin as it is consumed.
fn take_return_to(state: &AppState, session: &mut Session) -> Option<String> {
    session
        .take_return_to()
        .filter(|target| is_safe_return_to(target, &state.config().urls.web))
}

/// POST /:locale/login
pub async fn login(
    State(state): State<AppState>,
    locale: Locale,
    accepts: Accepts,
    mut session: Session,
    FormOrJson(body): FormOrJson<LoginRequest>,
) -> AppResult<Response> {
    let outcome = log_in(&state, &locale, &mut session, body).await;
    respond(session, &accepts, outcome, locale.path("/login")).await
}

async fn log_in(
    state: &AppState,
    locale: &Locale,
    session: &mut Session,
    body: LoginRequest,
) -> AppResult<Reply> {
    let email = body.email.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    let user = match state.credentials.verify(&email, &password).await {
        Ok(user) => user,
        Err(AuthFailure::Backend(e)) => return Err(e),
        Err(failure) => {
            let phrase = failure.phrase().unwrap_or(Phrase::UnknownError);
            return Err(AppError::BadRequest(locale.t(phrase)));
        }
    };

    session.log_in(user.id);
    info!(user_id = %user.id, "logged in");
    Ok(Reply::redirect(
        locale.t(Phrase::LoggedIn),
        take_return_to(state, session),
        locale.path(&state.config().auth.success_redirect),
    )
    .auto_redirect())
}

/// POST /:locale/signup
pub async fn register(
    State(state): State<AppState>,
    locale: Locale,
    accepts: Accepts,
    mut session: Session,
    FormOrJson(body): FormOrJson<RegisterRequest>,
) -> AppResult<Response> {
    let outcome = sign_up(&state, &locale, &mut session, body).await;
    respond(session, &accepts, outcome, locale.path("/signup")).await
}

async fn sign_up(
    state: &AppState,
    locale: &Locale,
    session: &mut Session,
    body: RegisterRequest,
) -> AppResult<Reply> {
    if body.is_empty() {
        return Err(AppError::BadData(locale.t(Phrase::MissingRegisterFields)));
    }
    let email = require_email(locale, body.email.as_deref())?;
    let password = require_password(locale, body.password.as_deref())?;
    require_strength(state, locale, password)?;

    let admins = state.users().count_by_group(Group::Admin).await?;
    let group = if admins == 0 { Group::Admin } else { Group::User };
    let user = state
        .users()
        .register(NewUser {
            email,
            password_hash: AuthAppService::hash_password(password)?,
            group,
        })
        .await
        .map_err(|e| match e {
            AppError::DuplicateEmail => AppError::BadRequest(locale.t(Phrase::UserExists)),
            other => other,
        })?;
    info!(user_id = %user.id, group = user.group.as_str(), "registered");

    session.log_in(user.id);
    state.mailer().queue_welcome(&user, locale).await;
    Ok(Reply::redirect(
        locale.t(Phrase::Registered),
        take_return_to(state, session),
        locale.path(&state.config().auth.success_redirect),
    ))
}

/// GET /:locale/forgot-password
pub async fn forgot_password_page(
    State(state): State<AppState>,
    locale: Locale,
    session: Session,
) -> AppResult<Response> {
    render_page(&state, &locale, session, views::forgot_password).await
}

/// POST /:locale/forgot-password
///
/// Unknown emails get the same answer as known ones.
pub async fn forgot_password(
    State(state): State<AppState>,
    locale: Locale,
    accepts: Accepts,
    session: Session,
    FormOrJson(body): FormOrJson<ForgotPasswordRequest>,
) -> AppResult<Response> {
    let back_to = locale.path("/forgot-password");
    let outcome = request_reset(&state, &locale, &accepts, &back_to, body).await;
    respond(session, &accepts, outcome, back_to).await
}

async fn request_reset(
    state: &AppState,
    locale: &Locale,
    accepts: &Accepts,
    back_to: &str,
    body: ForgotPasswordRequest,
) -> AppResult<Reply> {
    let email = require_email(locale, body.email.as_deref())?;
    let reply = Reply::back(locale.t(Phrase::PasswordResetSent), accepts, back_to.to_string());

    let Some(user) = state.users().find_by_email(&email).await? else {
        return Ok(reply);
    };

    let now = Utc::now();
    if let ReissueDecision::Limited { retry_at } = reset::check_reissue(&user, now) {
        return Err(AppError::BadRequest(
            locale.t_with(Phrase::PasswordResetLimit, &locale.from_now(retry_at, now)),
        ));
    }

    let issued = reset::issue(now);
    let user = state.users().update(user.id, issued.update).await?;
    info!(user_id = %user.id, expires_at = %issued.expires_at, "issued reset token");

    state
        .mailer()
        .queue_reset_password(&user, &issued.token, locale)
        .await;
    Ok(reply)
}

/// GET /:locale/reset-password/:token
pub async fn reset_password_page(
    State(state): State<AppState>,
    locale: Locale,
    Path((_, token)): Path<(String, String)>,
    session: Session,
) -> AppResult<Response> {
    render_page(&state, &locale, session, |ctx| views::reset_password(ctx, &token)).await
}

/// POST /:locale/reset-password/:token
///
/// Wrong email, wrong token and expired token all produce the same error.
pub async fn reset_password(
    State(state): State<AppState>,
    locale: Locale,
    accepts: Accepts,
    Path((_, token)): Path<(String, String)>,
    mut session: Session,
    FormOrJson(body): FormOrJson<ResetPasswordRequest>,
) -> AppResult<Response> {
    let outcome = complete_reset(&state, &locale, &mut session, &token, body).await;
    let back_to = locale.path(&format!("/reset-password/{}", token));
    respond(session, &accepts, outcome, back_to).await
}

async fn complete_reset(
    state: &AppState,
    locale: &Locale,
    session: &mut Session,
    token: &str,
    body: ResetPasswordRequest,
) -> AppResult<Reply> {
    let email = require_email(locale, body.email.as_deref())?;
    let password = require_password(locale, body.password.as_deref())?;
    if AuthAppService::is_blank(token) {
        return Err(AppError::BadRequest(locale.t(Phrase::InvalidResetToken)));
    }

    let digest = AuthAppService::token_digest(token.trim());
    let user = state
        .users()
        .find_by_reset_token(&email, &digest, Utc::now())
        .await?
        .ok_or_else(|| AppError::BadRequest(locale.t(Phrase::InvalidResetPassword)))?;

    // Rejected before any state change: token stays valid, no login.
    require_strength(state, locale, password)?;

    let password_hash = AuthAppService::hash_password(password)?;
    let user = state
        .users()
        .update(user.id, reset::consume(password_hash))
        .await?;
    info!(user_id = %user.id, "password reset");

    session.log_in(user.id);
    Ok(Reply::redirect(locale.t(Phrase::ResetPassword), None, locale.root()))
}
