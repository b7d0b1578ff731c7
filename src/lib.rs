//! Web application backend: signup, login, logout and password reset flows.
//!
//! Users and email jobs live in PostgreSQL, sessions in Redis. The
//! [`db::memory`] stores stand in for both in tests.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod i18n;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;
pub mod views;

pub use config::Config;
pub use error::AppError;
pub use handlers::http::AppState;
pub use services::{CookieSigner, Mailer};

use axum::routing::get;
use handlers::http;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Build the application router. Used by main and by integration tests.
pub fn create_app(state: AppState) -> axum::Router {
    let timeout = state.config.web_request_timeout;

    axum::Router::new()
        .route("/", get(http::root))
        .route("/health", get(http::health))
        .route("/:locale", get(http::home))
        .route("/:locale/logout", get(auth::logout))
        .route("/:locale/signup", get(auth::signup_or_login).post(auth::register))
        .route("/:locale/login", get(auth::signup_or_login).post(auth::login))
        .route(
            "/:locale/forgot-password",
            get(auth::forgot_password_page).post(auth::forgot_password),
        )
        .route(
            "/:locale/reset-password/:token",
            get(auth::reset_password_page).post(auth::reset_password),
        )
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
