//! Webhook signature verification.
//!
//! The CMS signs each delivery with a header of the form
//! `t=<unix seconds>,v1=<signature>`, where the signature is the base64url
//! HMAC-SHA256 of `"<t>.<raw body>"` keyed with the shared secret.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "sanity-webhook-signature";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Missing webhook signature")]
    Missing,
    #[error("Malformed webhook signature")]
    Malformed,
    #[error("Invalid webhook signature")]
    Mismatch,
    #[error("Webhook secret is not configured")]
    NotConfigured,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignaturePolicy {
    Require { secret: String },
    /// Verification skipped. Only reachable through the explicit
    /// `allow_unsigned` setting with no secret configured.
    AllowUnsigned,
    RejectAll,
}

impl SignaturePolicy {
    pub fn from_config(secret: Option<&str>, allow_unsigned: bool) -> Self {
        match secret.map(str::trim) {
            Some(secret) if !secret.is_empty() => SignaturePolicy::Require {
                secret: secret.to_string(),
            },
            _ if allow_unsigned => SignaturePolicy::AllowUnsigned,
            _ => SignaturePolicy::RejectAll,
        }
    }

    pub fn verify(&self, header: Option<&str>, body: &[u8]) -> Result<(), SignatureError> {
        match self {
            SignaturePolicy::AllowUnsigned => Ok(()),
            SignaturePolicy::RejectAll => Err(SignatureError::NotConfigured),
            SignaturePolicy::Require { secret } => {
                let header = header.ok_or(SignatureError::Missing)?;
                let (timestamp, signatures) = parse_header(header)?;
                let expected = compute_signature(secret, timestamp, body);
                let matched = signatures.iter().any(|candidate| {
                    match URL_SAFE_NO_PAD.decode(candidate.trim_end_matches('=')) {
                        Ok(decoded) => bool::from(decoded.as_slice().ct_eq(expected.as_slice())),
                        Err(_) => false,
                    }
                });
                if matched {
                    Ok(())
                } else {
                    Err(SignatureError::Mismatch)
                }
            }
        }
    }
}

fn parse_header(header: &str) -> Result<(&str, Vec<&str>), SignatureError> {
    let mut timestamp = None;
    let mut signatures = vec![];
    for part in header.split(',') {
        let (key, value) = part
            .trim()
            .split_once('=')
            .ok_or(SignatureError::Malformed)?;
        match key {
            "t" => timestamp = Some(value),
            "v1" => signatures.push(value),
            _ => {}
        }
    }
    match timestamp {
        Some(t) if !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()) && !signatures.is_empty() => {
            Ok((t, signatures))
        }
        _ => Err(SignatureError::Malformed),
    }
}

fn compute_signature(secret: &str, timestamp: &str, body: &[u8]) -> Vec<u8> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    mac.finalize().into_bytes().to_vec()
}

/// Builds a header value for `body`. Used by tests and tooling that replays
/// deliveries against a local server.
pub fn sign(secret: &str, timestamp: i64, body: &[u8]) -> String {
    let timestamp = timestamp.to_string();
    let signature = URL_SAFE_NO_PAD.encode(compute_signature(secret, &timestamp, body));
    format!("t={},v1={}", timestamp, signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec-test";
    const BODY: &[u8] = br#"{"operation":"create"}"#;

    fn policy() -> SignaturePolicy {
        SignaturePolicy::from_config(Some(SECRET), false)
    }

    #[test]
    fn accepts_valid_signature() {
        let header = sign(SECRET, 1_700_000_000, BODY);
        assert_eq!(policy().verify(Some(&header), BODY), Ok(()));
    }

    #[test]
    fn accepts_padded_signature() {
        let header = format!("{}=", sign(SECRET, 1_700_000_000, BODY));
        assert_eq!(policy().verify(Some(&header), BODY), Ok(()));
    }

    #[test]
    fn rejects_tampered_body() {
        let header = sign(SECRET, 1_700_000_000, BODY);
        assert_eq!(
            policy().verify(Some(&header), br#"{"operation":"delete"}"#),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_wrong_secret() {
        let header = sign("other", 1_700_000_000, BODY);
        assert_eq!(
            policy().verify(Some(&header), BODY),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_missing_and_malformed_headers() {
        assert_eq!(policy().verify(None, BODY), Err(SignatureError::Missing));
        assert_eq!(
            policy().verify(Some("garbage"), BODY),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            policy().verify(Some("t=abc,v1=xyz"), BODY),
            Err(SignatureError::Malformed)
        );
        assert_eq!(
            policy().verify(Some("t=123"), BODY),
            Err(SignatureError::Malformed)
        );
    }

    #[test]
    fn unsigned_requires_explicit_flag() {
        assert_eq!(
            SignaturePolicy::from_config(None, false),
            SignaturePolicy::RejectAll
        );
        assert_eq!(
            SignaturePolicy::from_config(Some("  "), false).verify(None, BODY),
            Err(SignatureError::NotConfigured)
        );
        assert_eq!(
            SignaturePolicy::from_config(None, true).verify(None, BODY),
            Ok(())
        );
    }

    #[test]
    fn secret_wins_over_allow_unsigned() {
        let policy = SignaturePolicy::from_config(Some(SECRET), true);
        assert_eq!(policy.verify(None, BODY), Err(SignatureError::Missing));
    }
}
