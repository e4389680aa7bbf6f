//! Webhook signature verification.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw body, keyed by the
//! webhook secret, and sends the result in `X-Hub-Signature-256` as
//! `sha256=<hex>`. The body must be verified byte-for-byte before it is
//! parsed.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_PREFIX: &str = "sha256=";

/// Why a delivery's signature was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("signature header does not start with \"sha256=\"")]
    MissingPrefix,

    #[error("signature is not a hex-encoded digest")]
    MalformedDigest,

    #[error("signature does not match the payload")]
    Mismatch,
}

fn keyed_mac(secret: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length")
}

/// Returns the `X-Hub-Signature-256` value GitHub would send for `payload`.
///
/// # Examples
///
/// ```
/// use release_cascade::webhooks::{sign_payload, verify_signature};
///
/// let header = sign_payload(b"{}", b"secret");
/// assert!(header.starts_with("sha256="));
/// assert!(verify_signature(b"{}", &header, b"secret").is_ok());
/// ```
pub fn sign_payload(payload: &[u8], secret: &[u8]) -> String {
    let mut mac = keyed_mac(secret);
    mac.update(payload);
    format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    )
}

/// Checks `header` against the HMAC of `payload` under `secret`.
///
/// The digest comparison runs in constant time.
///
/// # Examples
///
/// ```
/// use release_cascade::webhooks::{SignatureError, sign_payload, verify_signature};
///
/// let header = sign_payload(b"payload", b"right");
/// assert_eq!(
///     verify_signature(b"payload", &header, b"wrong"),
///     Err(SignatureError::Mismatch)
/// );
/// assert_eq!(
///     verify_signature(b"payload", "md5=abc", b"right"),
///     Err(SignatureError::MissingPrefix)
/// );
/// ```
pub fn verify_signature(payload: &[u8], header: &str, secret: &[u8]) -> Result<(), SignatureError> {
    let digest = header
        .trim()
        .strip_prefix(SIGNATURE_PREFIX)
        .ok_or(SignatureError::MissingPrefix)?;
    let expected = hex::decode(digest).map_err(|_| SignatureError::MalformedDigest)?;

    let mut mac = keyed_mac(secret);
    mac.update(payload);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}
