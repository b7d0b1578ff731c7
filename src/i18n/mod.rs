//! Locale resolution and the built-in phrase catalogue.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use std::convert::Infallible;

use crate::handlers::http::AppState;

/// Message keys used by the auth flows and pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrase {
    LoggedIn,
    Registered,
    PasswordResetSent,
    /// Takes one argument: the humanized time until a new request is allowed.
    PasswordResetLimit,
    ResetPassword,
    InvalidEmail,
    InvalidPassword,
    InvalidPasswordStrength,
    InvalidResetToken,
    InvalidResetPassword,
    MissingRegisterFields,
    MissingCredentials,
    InvalidCredentials,
    UserExists,
    UnknownError,
    SignUp,
    LogIn,
    ForgotPassword,
    Email,
    Password,
    Welcome,
}

fn en(phrase: Phrase) -> &'static str {
    match phrase {
        Phrase::LoggedIn => "You have successfully logged in.",
        Phrase::Registered => "You have successfully registered.",
        Phrase::PasswordResetSent => {
            "We have sent you an email with a link to reset your password."
        }
        Phrase::PasswordResetLimit => {
            "You can only request a password reset every 30 minutes. Please try again {}."
        }
        Phrase::ResetPassword => "You have successfully reset your password.",
        Phrase::InvalidEmail => "Email address was invalid.",
        Phrase::InvalidPassword => "Password was invalid.",
        Phrase::InvalidPasswordStrength => "Password strength was not strong enough.",
        Phrase::InvalidResetToken => "Reset token provided was invalid.",
        Phrase::InvalidResetPassword => "Reset token and email were not valid together.",
        Phrase::MissingRegisterFields => "Please fill out all required fields.",
        Phrase::MissingCredentials => "Please enter your email and password.",
        Phrase::InvalidCredentials => "Password or email is incorrect.",
        Phrase::UserExists => "A user with the given email is already registered.",
        Phrase::UnknownError => "An unknown error has occurred.",
        Phrase::SignUp => "sign up",
        Phrase::LogIn => "log in",
        Phrase::ForgotPassword => "Forgot password",
        Phrase::Email => "Email",
        Phrase::Password => "Password",
        Phrase::Welcome => "Welcome",
    }
}

fn es(phrase: Phrase) -> &'static str {
    match phrase {
        Phrase::LoggedIn => "Has iniciado sesión correctamente.",
        Phrase::Registered => "Te has registrado correctamente.",
        Phrase::PasswordResetSent => {
            "Te hemos enviado un correo con un enlace para restablecer tu contraseña."
        }
        Phrase::PasswordResetLimit => {
            "Solo puedes solicitar un restablecimiento cada 30 minutos. Inténtalo de nuevo {}."
        }
        Phrase::ResetPassword => "Has restablecido tu contraseña correctamente.",
        Phrase::InvalidEmail => "La dirección de correo no es válida.",
        Phrase::InvalidPassword => "La contraseña no es válida.",
        Phrase::InvalidPasswordStrength => "La contraseña no es lo bastante segura.",
        Phrase::InvalidResetToken => "El token de restablecimiento no es válido.",
        Phrase::InvalidResetPassword => "El token y el correo no son válidos juntos.",
        Phrase::MissingRegisterFields => "Por favor completa todos los campos obligatorios.",
        Phrase::MissingCredentials => "Introduce tu correo y contraseña.",
        Phrase::InvalidCredentials => "La contraseña o el correo son incorrectos.",
        Phrase::UserExists => "Ya existe un usuario registrado con ese correo.",
        Phrase::UnknownError => "Ha ocurrido un error desconocido.",
        Phrase::SignUp => "registrarte",
        Phrase::LogIn => "iniciar sesión",
        Phrase::ForgotPassword => "Olvidé mi contraseña",
        Phrase::Email => "Correo",
        Phrase::Password => "Contraseña",
        Phrase::Welcome => "Bienvenido",
    }
}

/// Request locale, taken from the first path segment (`/es/login`).
///
/// Unsupported or missing segments resolve to the configured default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(String);

impl Locale {
    pub fn new(locale: impl Into<String>) -> Self {
        Self(locale.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `/<locale>`
    pub fn root(&self) -> String {
        format!("/{}", self.0)
    }

    /// `/<locale><path>`
    pub fn path(&self, path: &str) -> String {
        format!("/{}{}", self.0, path)
    }

    pub fn t(&self, phrase: Phrase) -> String {
        self.lookup(phrase).to_string()
    }

    /// Translate a phrase with a single `{}` placeholder.
    pub fn t_with(&self, phrase: Phrase, arg: &str) -> String {
        self.lookup(phrase).replacen("{}", arg, 1)
    }

    fn lookup(&self, phrase: Phrase) -> &'static str {
        match self.0.as_str() {
            "es" => es(phrase),
            _ => en(phrase),
        }
    }

    /// Relative time from `now` until `target`, e.g. `in 12 minutes`.
    pub fn from_now(&self, target: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let secs = (target - now).num_seconds();
        let future = secs >= 0;
        let secs = secs.abs();
        let minutes = (secs as f64 / 60.0).round() as i64;
        let hours = (secs as f64 / 3600.0).round() as i64;

        let spanish = self.0 == "es";
        let span = match (secs, spanish) {
            (0..=44, false) => "a few seconds".to_string(),
            (0..=44, true) => "unos segundos".to_string(),
            (45..=89, false) => "a minute".to_string(),
            (45..=89, true) => "un minuto".to_string(),
            (_, false) if secs < 45 * 60 => format!("{} minutes", minutes),
            (_, true) if secs < 45 * 60 => format!("{} minutos", minutes),
            (_, false) if secs < 90 * 60 => "an hour".to_string(),
            (_, true) if secs < 90 * 60 => "una hora".to_string(),
            (_, false) => format!("{} hours", hours),
            (_, true) => format!("{} horas", hours),
        };

        match (future, spanish) {
            (true, false) => format!("in {}", span),
            (false, false) => format!("{} ago", span),
            (true, true) => format!("en {}", span),
            (false, true) => format!("hace {}", span),
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Locale {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let i18n = &state.config.i18n;
        let segment = parts
            .uri
            .path()
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or("")
            .to_lowercase();
        if i18n.is_supported(&segment) {
            Ok(Locale(segment))
        } else {
            Ok(Locale(i18n.default_locale.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn translates_with_fallback_to_english() {
        assert_eq!(Locale::new("es").t(Phrase::SignUp), "registrarte");
        assert_eq!(Locale::new("fr").t(Phrase::SignUp), "sign up");
    }

    #[test]
    fn substitutes_single_argument() {
        let msg = Locale::new("en").t_with(Phrase::PasswordResetLimit, "in 5 minutes");
        assert!(msg.ends_with("Please try again in 5 minutes."));
    }

    #[test]
    fn builds_locale_prefixed_paths() {
        let locale = Locale::new("en");
        assert_eq!(locale.root(), "/en");
        assert_eq!(locale.path("/dashboard"), "/en/dashboard");
    }

    #[test]
    fn humanizes_relative_time() {
        let now = Utc::now();
        let en = Locale::new("en");
        assert_eq!(en.from_now(now + Duration::seconds(10), now), "in a few seconds");
        assert_eq!(en.from_now(now + Duration::seconds(60), now), "in a minute");
        assert_eq!(en.from_now(now + Duration::minutes(12), now), "in 12 minutes");
        assert_eq!(en.from_now(now + Duration::minutes(30), now), "in 30 minutes");
        assert_eq!(en.from_now(now + Duration::minutes(60), now), "in an hour");
        assert_eq!(en.from_now(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(
            Locale::new("es").from_now(now + Duration::minutes(12), now),
            "en 12 minutos"
        );
    }
}
