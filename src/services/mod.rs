//! Business services: cookie signing and transactional email.

pub mod mailer;
pub mod signer;

pub use mailer::Mailer;
pub use signer::CookieSigner;
