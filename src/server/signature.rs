//! Webhook signature verification.
//!
//! Deliveries are signed with an HMAC of the raw body keyed by the app
//! secret. `X-Hub-Signature-256` (SHA-256) is checked when present, otherwise
//! the legacy `X-Hub-Signature` (SHA-1).

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

pub const SIGNATURE_256_HEADER: &str = "x-hub-signature-256";
pub const SIGNATURE_HEADER: &str = "x-hub-signature";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing signature header")]
    Missing,
    #[error("malformed signature header")]
    Malformed,
    #[error("unsupported signature algorithm `{0}`")]
    Unsupported(String),
    #[error("signature does not match body")]
    Mismatch,
}

/// Check the delivery signature in `headers` against `body`.
pub fn verify_signature(
    app_secret: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), SignatureError> {
    let header = headers
        .get(SIGNATURE_256_HEADER)
        .or_else(|| headers.get(SIGNATURE_HEADER))
        .ok_or(SignatureError::Missing)?;
    let value = header.to_str().map_err(|_| SignatureError::Malformed)?;
    let (algorithm, hex_digest) = value.split_once('=').ok_or(SignatureError::Malformed)?;
    let provided = hex::decode(hex_digest.trim()).map_err(|_| SignatureError::Malformed)?;

    let expected = match algorithm {
        "sha256" => hmac_sha256(app_secret.as_bytes(), body)?,
        "sha1" => hmac_sha1(app_secret.as_bytes(), body)?,
        other => return Err(SignatureError::Unsupported(other.to_string())),
    };

    if bool::from(expected.as_slice().ct_eq(provided.as_slice())) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

fn hmac_sha256(key: &[u8], body: &[u8]) -> Result<Vec<u8>, SignatureError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key).map_err(|_| SignatureError::Mismatch)?;
    mac.update(body);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hmac_sha1(key: &[u8], body: &[u8]) -> Result<Vec<u8>, SignatureError> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key).map_err(|_| SignatureError::Mismatch)?;
    mac.update(body);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// `sha256=<hex>` header value for `body`. Used to sign test deliveries.
pub fn sign_sha256(app_secret: &str, body: &[u8]) -> String {
    match hmac_sha256(app_secret.as_bytes(), body) {
        Ok(digest) => format!("sha256={}", hex::encode(digest)),
        Err(_) => String::new(),
    }
}
