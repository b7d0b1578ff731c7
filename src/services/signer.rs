//! Session cookie signing: `<value>.<hex(HMAC-SHA256(key, value))>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tracing::debug;

use crate::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct CookieSigner {
    key: Arc<str>,
}

impl CookieSigner {
    pub fn new(key: &str) -> Self {
        Self { key: Arc::from(key) }
    }

    fn mac(&self) -> AppResult<HmacSha256> {
        HmacSha256::new_from_slice(self.key.as_bytes())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init: {}", e)))
    }

    pub fn sign(&self, value: &str) -> AppResult<String> {
        let mut mac = self.mac()?;
        mac.update(value.as_bytes());
        let result = mac.finalize();
        Ok(format!("{}.{}", value, hex::encode(result.into_bytes())))
    }

    /// Return the unsigned value if the signature matches.
    pub fn unsign(&self, signed: &str) -> Option<String> {
        let (value, signature) = signed.rsplit_once('.')?;
        let signature = hex::decode(signature).ok()?;
        let mut mac = self.mac().ok()?;
        mac.update(value.as_bytes());
        if mac.verify_slice(&signature).is_err() {
            debug!("cookie signature mismatch");
            return None;
        }
        Some(value.to_string())
    }
}
