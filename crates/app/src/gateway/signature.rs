//! Webhook signature verification.
//!
//! Deliveries carry a `t=<unix seconds>,v1=<hex>` header where each `v1` is an
//! HMAC-SHA256 of `"{t}.{body}"` keyed by the endpoint secret.

use hmac::{Hmac, Mac};
use jiff::Timestamp;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age, in seconds, of a signed delivery.
pub const DEFAULT_SIGNATURE_TOLERANCE_SECONDS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature header is missing")]
    Missing,

    #[error("signature header is malformed")]
    Malformed,

    #[error("no signature matches the payload")]
    Mismatch,

    #[error("signature timestamp is outside the tolerance window")]
    Expired,

    #[error("webhook secret must not be empty")]
    EmptySecret,
}

#[derive(Clone)]
pub struct WebhookVerifier {
    mac: HmacSha256,
    tolerance_seconds: i64,
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> Result<Self, SignatureError> {
        if secret.is_empty() {
            return Err(SignatureError::EmptySecret);
        }

        let mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
            .map_err(|_invalid| SignatureError::EmptySecret)?;

        Ok(Self {
            mac,
            tolerance_seconds: DEFAULT_SIGNATURE_TOLERANCE_SECONDS,
        })
    }

    #[must_use]
    pub fn with_tolerance(mut self, seconds: i64) -> Self {
        self.tolerance_seconds = seconds;
        self
    }

    pub fn verify(&self, payload: &[u8], header: &str) -> Result<(), SignatureError> {
        self.verify_at(payload, header, Timestamp::now())
    }

    /// Verify against an explicit clock.
    pub fn verify_at(
        &self,
        payload: &[u8],
        header: &str,
        now: Timestamp,
    ) -> Result<(), SignatureError> {
        let header = header.trim();

        if header.is_empty() {
            return Err(SignatureError::Missing);
        }

        let mut timestamp = None;
        let mut candidates = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };

            match key {
                "t" => {
                    timestamp = Some(
                        value
                            .parse::<i64>()
                            .map_err(|_invalid| SignatureError::Malformed)?,
                    );
                }
                "v1" => candidates.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureError::Malformed)?;

        if candidates.is_empty() {
            return Err(SignatureError::Malformed);
        }

        let expected = self.signature(payload, timestamp);

        let matched = candidates.iter().fold(false, |matched, candidate| {
            let equal: bool = expected.as_bytes().ct_eq(candidate.as_bytes()).into();

            matched | equal
        });

        if !matched {
            return Err(SignatureError::Mismatch);
        }

        if (now.as_second() - timestamp).abs() > self.tolerance_seconds {
            return Err(SignatureError::Expired);
        }

        Ok(())
    }

    /// Build a header value for `payload` signed at `timestamp`.
    #[must_use]
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> String {
        format!("t={timestamp},v1={}", self.signature(payload, timestamp))
    }

    fn signature(&self, payload: &[u8], timestamp: i64) -> String {
        let mut mac = self.mac.clone();

        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);

        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("tolerance_seconds", &self.tolerance_seconds)
            .finish_non_exhaustive()
    }
}
