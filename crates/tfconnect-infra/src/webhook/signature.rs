//! Webhook signature verification.
//!
//! Inbound actions are signed with the client secret:
//! `x-port-signature: v1,<base64(HMAC-SHA256(secret, "<timestamp>.<body>"))>`
//! where `<timestamp>` is the `x-port-timestamp` header value. The check
//! runs over the raw body bytes before any parsing.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signature.
pub const SIGNATURE_HEADER: &str = "x-port-signature";
/// Header carrying the signed timestamp.
pub const TIMESTAMP_HEADER: &str = "x-port-timestamp";

const VERSION_PREFIX: &str = "v1,";

/// Errors from webhook signature verification.
#[derive(Debug, thiserror::Error)]
pub enum SignatureError {
    #[error("missing {SIGNATURE_HEADER}")]
    MissingSignature,

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("invalid signature")]
    Mismatch,

    #[error("invalid HMAC key: {0}")]
    InvalidKey(String),
}

/// Verify a `v1,`-prefixed signature over `"{timestamp}.{body}"`.
///
/// Comparison is constant time (`Mac::verify_slice`). A missing
/// timestamp header is treated as the empty string, so the signature
/// still has to match.
pub fn verify_port_signature(
    secret: &[u8],
    timestamp: Option<&str>,
    body: &[u8],
    signature: Option<&str>,
) -> Result<(), SignatureError> {
    let signature = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::MissingSignature)?;

    let encoded = signature.strip_prefix(VERSION_PREFIX).ok_or_else(|| {
        SignatureError::MalformedSignature(format!("expected '{VERSION_PREFIX}' prefix"))
    })?;
    let expected = STANDARD
        .decode(encoded)
        .map_err(|e| SignatureError::MalformedSignature(e.to_string()))?;

    let mac = signing_mac(secret, timestamp.unwrap_or_default(), body)?;
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Compute the `v1,<base64>` header value for `body`.
///
/// Used by tests and by operators replaying captured events.
pub fn compute_port_signature(
    secret: &[u8],
    timestamp: &str,
    body: &[u8],
) -> Result<String, SignatureError> {
    let mac = signing_mac(secret, timestamp, body)?;
    Ok(format!(
        "{VERSION_PREFIX}{}",
        STANDARD.encode(mac.finalize().into_bytes())
    ))
}

fn signing_mac(secret: &[u8], timestamp: &str, body: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(mac)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"client-secret";
    const BODY: &[u8] = br#"{"context":{"runId":"r_1"}}"#;

    #[test]
    fn test_valid_signature() {
        let sig = compute_port_signature(SECRET, "1700000000", BODY).unwrap();
        assert!(sig.starts_with("v1,"));
        assert!(verify_port_signature(SECRET, Some("1700000000"), BODY, Some(&sig)).is_ok());
    }

    #[test]
    fn test_signature_matches_manual_hmac() {
        let mut mac = HmacSha256::new_from_slice(SECRET).unwrap();
        mac.update(b"42.");
        mac.update(BODY);
        let manual = format!("v1,{}", STANDARD.encode(mac.finalize().into_bytes()));

        assert_eq!(compute_port_signature(SECRET, "42", BODY).unwrap(), manual);
    }

    #[test]
    fn test_missing_signature() {
        let result = verify_port_signature(SECRET, Some("1"), BODY, None);
        assert!(matches!(result, Err(SignatureError::MissingSignature)));
        let result = verify_port_signature(SECRET, Some("1"), BODY, Some("  "));
        assert!(matches!(result, Err(SignatureError::MissingSignature)));
    }

    #[test]
    fn test_missing_version_prefix() {
        let sig = compute_port_signature(SECRET, "1", BODY).unwrap();
        let bare = sig.trim_start_matches("v1,");
        let result = verify_port_signature(SECRET, Some("1"), BODY, Some(bare));
        assert!(matches!(result, Err(SignatureError::MalformedSignature(_))));
    }

    #[test]
    fn test_undecodable_signature() {
        let result = verify_port_signature(SECRET, Some("1"), BODY, Some("v1,@@@"));
        assert!(matches!(result, Err(SignatureError::MalformedSignature(_))));
    }

    #[test]
    fn test_tampered_body() {
        let sig = compute_port_signature(SECRET, "1", BODY).unwrap();
        let result = verify_port_signature(SECRET, Some("1"), b"{}", Some(&sig));
        assert!(matches!(result, Err(SignatureError::Mismatch)));
    }

    #[test]
    fn test_wrong_timestamp() {
        let sig = compute_port_signature(SECRET, "1", BODY).unwrap();
        let result = verify_port_signature(SECRET, Some("2"), BODY, Some(&sig));
        assert!(matches!(result, Err(SignatureError::Mismatch)));
    }

    #[test]
    fn test_wrong_secret() {
        let sig = compute_port_signature(SECRET, "1", BODY).unwrap();
        let result = verify_port_signature(b"other", Some("1"), BODY, Some(&sig));
        assert!(matches!(result, Err(SignatureError::Mismatch)));
    }

    #[test]
    fn test_missing_timestamp_signs_empty_string() {
        let sig = compute_port_signature(SECRET, "", BODY).unwrap();
        assert!(verify_port_signature(SECRET, None, BODY, Some(&sig)).is_ok());
    }
}
