//! HTTP request handlers and response helpers.

pub mod http;
pub mod respond;

pub use http::*;
pub use respond::{finish, respond, see_other, Accepts, FormOrJson, Reply};
