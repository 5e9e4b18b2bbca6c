//! Webhook authentication.
//!
//! One validator implementation per platform auth scheme, unified
//! behind a single interface so dispatch never branches on platform
//! specifics. All comparisons are constant-time: HMAC verification via
//! the `hmac` crate's `verify_slice`, token comparison via `subtle`.
//! Validation happens before any payload parsing.

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{WebhookError, WebhookResult};
use remedy_core::AuthScheme;

type HmacSha256 = Hmac<Sha256>;

/// Validates one inbound webhook call against the platform's configured
/// secret.
pub trait WebhookValidator: Send + Sync {
    fn validate(&self, raw_payload: &[u8], headers: &HeaderMap) -> WebhookResult<()>;
}

/// HMAC-SHA256 of the raw payload, hex-encoded in a header with an
/// optional prefix (GitHub style: `x-hub-signature-256: sha256=<hex>`).
pub struct HmacSignatureValidator {
    secret: Vec<u8>,
    header: String,
    prefix: String,
}

impl HmacSignatureValidator {
    pub fn new(secret: impl Into<Vec<u8>>, header: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            header: header.into(),
            prefix: prefix.into(),
        }
    }
}

impl WebhookValidator for HmacSignatureValidator {
    fn validate(&self, raw_payload: &[u8], headers: &HeaderMap) -> WebhookResult<()> {
        let provided = headers
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .ok_or(WebhookError::Unauthorized("missing signature header"))?;

        let hex_digest = provided
            .strip_prefix(&self.prefix)
            .ok_or(WebhookError::Unauthorized("malformed signature header"))?;
        let expected = hex::decode(hex_digest)
            .map_err(|_| WebhookError::Unauthorized("malformed signature header"))?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| WebhookError::Unauthorized("invalid webhook secret"))?;
        mac.update(raw_payload);
        mac.verify_slice(&expected)
            .map_err(|_| WebhookError::Unauthorized("signature mismatch"))
    }
}

/// Shared token carried verbatim in a header (GitLab style:
/// `x-gitlab-token: <secret>`).
pub struct TokenValidator {
    secret: Vec<u8>,
    header: String,
}

impl TokenValidator {
    pub fn new(secret: impl Into<Vec<u8>>, header: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            header: header.into(),
        }
    }
}

impl WebhookValidator for TokenValidator {
    fn validate(&self, _raw_payload: &[u8], headers: &HeaderMap) -> WebhookResult<()> {
        let provided = headers
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .ok_or(WebhookError::Unauthorized("missing token header"))?;

        if provided.as_bytes().ct_eq(&self.secret).into() {
            Ok(())
        } else {
            Err(WebhookError::Unauthorized("token mismatch"))
        }
    }
}

/// Build the validator for a configured auth scheme.
pub fn validator_for(scheme: &AuthScheme) -> Box<dyn WebhookValidator> {
    match scheme {
        AuthScheme::Signature {
            secret,
            header,
            prefix,
        } => Box::new(HmacSignatureValidator::new(
            secret.as_bytes().to_vec(),
            header.clone(),
            prefix.clone(),
        )),
        AuthScheme::Token { secret, header } => Box::new(TokenValidator::new(
            secret.as_bytes().to_vec(),
            header.clone(),
        )),
    }
}

/// Compute the hex HMAC-SHA256 digest of a payload. Used by tests and
/// by operators generating signatures for manual replays.
pub fn hex_digest(secret: &[u8], payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("hmac accepts any key length");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(name: &'static str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn valid_signature_is_accepted() {
        let secret = b"topsecret";
        let payload = br#"{"status":"failed"}"#;
        let validator =
            HmacSignatureValidator::new(secret.to_vec(), "x-hub-signature-256", "sha256=");
        let signature = format!("sha256={}", hex_digest(secret, payload));
        let headers = headers_with("x-hub-signature-256", &signature);

        assert!(validator.validate(payload, &headers).is_ok());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let secret = b"topsecret";
        let validator =
            HmacSignatureValidator::new(secret.to_vec(), "x-hub-signature-256", "sha256=");
        let signature = format!("sha256={}", hex_digest(secret, br#"{"status":"failed"}"#));
        let headers = headers_with("x-hub-signature-256", &signature);

        let err = validator
            .validate(br#"{"status":"success"}"#, &headers)
            .unwrap_err();
        assert!(matches!(err, WebhookError::Unauthorized(_)));
    }

    #[test]
    fn missing_signature_header_is_rejected() {
        let validator =
            HmacSignatureValidator::new(b"topsecret".to_vec(), "x-hub-signature-256", "sha256=");
        let err = validator.validate(b"{}", &HeaderMap::new()).unwrap_err();
        assert!(matches!(err, WebhookError::Unauthorized(_)));
    }

    #[test]
    fn wrong_secret_produces_mismatch() {
        let validator =
            HmacSignatureValidator::new(b"topsecret".to_vec(), "x-hub-signature-256", "sha256=");
        let signature = format!("sha256={}", hex_digest(b"wrong-secret", b"{}"));
        let headers = headers_with("x-hub-signature-256", &signature);
        assert!(validator.validate(b"{}", &headers).is_err());
    }

    #[test]
    fn token_validator_compares_constant_time() {
        let validator = TokenValidator::new(b"glpat-token".to_vec(), "x-gitlab-token");
        let ok = headers_with("x-gitlab-token", "glpat-token");
        let bad = headers_with("x-gitlab-token", "glpat-wrong");

        assert!(validator.validate(b"{}", &ok).is_ok());
        assert!(matches!(
            validator.validate(b"{}", &bad).unwrap_err(),
            WebhookError::Unauthorized(_)
        ));
    }
}
