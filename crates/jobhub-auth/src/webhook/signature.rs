//! HMAC-SHA256 signatures over canonical JSON bodies.
//!
//! The signed message is `canonical(body) || timestamp`, where the timestamp
//! is the raw header value (empty when absent). A JSON body is canonicalized
//! to compact form with object keys sorted, so re-serialization by proxies
//! or client libraries does not break signatures. A body that is not JSON is
//! signed as-is.

use std::borrow::Cow;
use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::error::WebhookAuthError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded signature.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Header carrying the epoch timestamp included in the signature.
pub const TIMESTAMP_HEADER: &str = "x-webhook-timestamp";

/// Optional prefix accepted in front of the hex digest.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Signs and checks webhook bodies with one shared secret.
#[derive(Clone)]
pub struct WebhookSigner {
    mac: HmacSha256,
}

impl std::fmt::Debug for WebhookSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSigner").finish_non_exhaustive()
    }
}

impl WebhookSigner {
    /// Create a signer keyed by `secret`.
    pub fn new(secret: &[u8]) -> Result<Self, WebhookAuthError> {
        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| WebhookAuthError::InvalidKey(e.to_string()))?;
        Ok(Self { mac })
    }

    /// Raw MAC over the canonical body and timestamp.
    fn digest(&self, body: &[u8], timestamp: Option<&str>) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(&canonical_body(body));
        mac.update(timestamp.unwrap_or("").as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    /// Lowercase hex signature for `body`, as sent in [`SIGNATURE_HEADER`].
    pub fn sign(&self, body: &[u8], timestamp: Option<&str>) -> String {
        hex::encode(self.digest(body, timestamp))
    }

    /// Check `signature` against `body` in constant time.
    ///
    /// Accepts the digest with or without the `sha256=` prefix, in either
    /// hex case.
    pub fn verify(&self, signature: &str, body: &[u8], timestamp: Option<&str>) -> bool {
        let signature = signature.trim();
        let hex_digest = signature
            .strip_prefix(SIGNATURE_PREFIX)
            .unwrap_or(signature);
        let Ok(received) = hex::decode(hex_digest) else {
            return false;
        };
        let expected = self.digest(body, timestamp);
        bool::from(expected.ct_eq(&received))
    }
}

/// Canonical bytes of a request body.
pub fn canonical_body(body: &[u8]) -> Cow<'_, [u8]> {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => serde_json::to_vec(&sort_keys(value))
            .map(Cow::Owned)
            .unwrap_or(Cow::Borrowed(body)),
        Err(_) => Cow::Borrowed(body),
    }
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn test_canonical_form_ignores_whitespace_and_key_order() {
        let a = br#"{"b": 1, "a": {"y": [1, 2], "x": null}}"#;
        let b = br#"{"a":{"x":null,"y":[1,2]},"b":1}"#;
        assert_eq!(canonical_body(a), canonical_body(b));
        assert_eq!(canonical_body(a).as_ref(), br#"{"a":{"x":null,"y":[1,2]},"b":1}"#);
    }

    #[test]
    fn test_non_json_body_signed_verbatim() {
        assert_eq!(canonical_body(b"not json").as_ref(), b"not json");
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = WebhookSigner::new(SECRET).unwrap();
        let body = br#"{"jobHandle":"x","status":"completed"}"#;
        let signature = signer.sign(body, Some("1767225600"));

        assert_eq!(signature.len(), 64);
        assert!(signer.verify(&signature, body, Some("1767225600")));
        assert!(signer.verify(&format!("sha256={signature}"), body, Some("1767225600")));
        assert!(signer.verify(&signature.to_uppercase(), body, Some("1767225600")));
        assert!(!signer.verify(&signature, body, Some("1767225601")));
        assert!(!signer.verify(&signature, body, None));
        assert!(!signer.verify("zz-not-hex", body, Some("1767225600")));
        assert!(!signer.verify(&signature[..32], body, Some("1767225600")));
    }

    #[test]
    fn test_different_secret_does_not_verify() {
        let body = br#"{"a":1}"#;
        let signature = WebhookSigner::new(SECRET).unwrap().sign(body, None);
        let other = WebhookSigner::new(b"another-secret").unwrap();
        assert!(!other.verify(&signature, body, None));
    }
}
