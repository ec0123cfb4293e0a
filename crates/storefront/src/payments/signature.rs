//! Mercado Pago webhook signature verification.
//!
//! The `x-signature` header has the form `ts=<unix>,v1=<hex hmac>`. The HMAC
//! is SHA-256 keyed with the webhook secret over a manifest built from the
//! notification's data id, the `x-request-id` header and `ts`:
//!
//! ```text
//! id:<data id>;request-id:<x-request-id>;ts:<ts>;
//! ```
//!
//! Parts whose value is missing are left out of the manifest.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing x-signature header")]
    MissingHeader,

    #[error("malformed x-signature header")]
    Malformed,

    #[error("signature mismatch")]
    Mismatch,
}

/// Parsed `x-signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader<'a> {
    pub ts: &'a str,
    pub v1: &'a str,
}

impl<'a> SignatureHeader<'a> {
    /// Parse `ts=…,v1=…` in any order, ignoring unknown parts.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError::Malformed`] if either part is missing.
    pub fn parse(header: &'a str) -> Result<Self, SignatureError> {
        let mut ts = None;
        let mut v1 = None;

        for part in header.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            match key.trim() {
                "ts" => ts = Some(value.trim()),
                "v1" => v1 = Some(value.trim()),
                _ => {}
            }
        }

        match (ts, v1) {
            (Some(ts), Some(v1)) if !ts.is_empty() && !v1.is_empty() => Ok(Self { ts, v1 }),
            _ => Err(SignatureError::Malformed),
        }
    }
}

/// Build the signed manifest.
#[must_use]
pub fn manifest(data_id: Option<&str>, request_id: Option<&str>, ts: &str) -> String {
    let mut manifest = String::new();
    if let Some(id) = data_id.filter(|id| !id.is_empty()) {
        // Alphanumeric ids are signed lowercased
        manifest.push_str(&format!("id:{};", id.to_ascii_lowercase()));
    }
    if let Some(request_id) = request_id.filter(|id| !id.is_empty()) {
        manifest.push_str(&format!("request-id:{request_id};"));
    }
    manifest.push_str(&format!("ts:{ts};"));
    manifest
}

/// Hex HMAC-SHA256 of `message`.
#[must_use]
pub fn sign(secret: &SecretString, message: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a notification against the configured secret.
///
/// # Errors
///
/// Returns an error if the header is missing, malformed, or does not match.
pub fn verify(
    secret: &SecretString,
    header: Option<&str>,
    data_id: Option<&str>,
    request_id: Option<&str>,
) -> Result<(), SignatureError> {
    let header = SignatureHeader::parse(header.ok_or(SignatureError::MissingHeader)?)?;
    let expected = sign(secret, &manifest(data_id, request_id, header.ts));

    if !constant_time_compare(&expected, &header.v1.to_ascii_lowercase()) {
        return Err(SignatureError::Mismatch);
    }
    Ok(())
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
