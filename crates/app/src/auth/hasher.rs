//! Keyed HMAC verifier for API token secrets.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Computes and checks the verifier stored for each API token.
///
/// Only the HMAC of a token's secret material is persisted, so a leaked
/// `api_tokens` table can't be replayed without the server key.
#[derive(Clone)]
pub struct ApiTokenHasher {
    mac: HmacSha256,
}

#[derive(Debug, Error)]
pub enum ApiTokenHasherError {
    #[error("api token key must not be empty")]
    EmptyKey,

    #[error("api token key was rejected")]
    InvalidKey,
}

impl ApiTokenHasher {
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self, ApiTokenHasherError> {
        let key = Zeroizing::new(key.into());

        if key.is_empty() {
            return Err(ApiTokenHasherError::EmptyKey);
        }

        let mac = <HmacSha256 as Mac>::new_from_slice(&key)
            .map_err(|_invalid| ApiTokenHasherError::InvalidKey)?;

        Ok(Self { mac })
    }

    /// Hex encoded HMAC-SHA256 of `input`.
    #[must_use]
    pub fn hmac(&self, input: &[u8]) -> String {
        let mut mac = self.mac.clone();

        mac.update(input);

        hex::encode(mac.finalize().into_bytes())
    }

    /// Constant-time comparison of `input` against a stored verifier.
    #[must_use]
    pub fn verify(&self, input: &[u8], stored: &str) -> bool {
        let expected = self.hmac(input);

        expected.as_bytes().ct_eq(stored.as_bytes()).into()
    }
}

impl std::fmt::Debug for ApiTokenHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiTokenHasher(**redacted**)")
    }
}
