//! Authentication: credential checks, sessions, password reset.

mod credentials;
mod handlers;
mod redirect;
pub mod reset;
mod service;

pub use credentials::{AuthFailure, CredentialVerifier, PasswordVerifier};
pub use handlers::{
    forgot_password, forgot_password_page, login, logout, register, reset_password,
    reset_password_page, signup_or_login,
};
pub use redirect::{is_safe_return_to, requested_return_to};
pub use service::AuthAppService;
