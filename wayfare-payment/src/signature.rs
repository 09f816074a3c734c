//! HMAC signing for gateway requests and callbacks.

use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha512};
use std::collections::HashMap;
use wayfare_core::payment::GatewayError;

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Hex-encoded HMAC-SHA256 of `payload`.
pub fn sign_sha256(secret: &str, payload: &str) -> Result<String, GatewayError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| GatewayError::Rejected("signing key rejected".to_string()))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Hex-encoded HMAC-SHA512 of `payload`.
pub fn sign_sha512(secret: &str, payload: &str) -> Result<String, GatewayError> {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .map_err(|_| GatewayError::Rejected("signing key rejected".to_string()))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a hex signature against HMAC-SHA256 of `payload`.
pub fn verify_sha256(secret: &str, payload: &str, signature_hex: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload.as_bytes());
    match hex::decode(signature_hex) {
        Ok(signature) => mac.verify_slice(&signature).is_ok(),
        Err(_) => false,
    }
}

/// Constant-time check of a hex signature against HMAC-SHA512 of `payload`.
pub fn verify_sha512(secret: &str, payload: &str, signature_hex: &str) -> bool {
    let mut mac = match HmacSha512::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload.as_bytes());
    match hex::decode(signature_hex) {
        Ok(signature) => mac.verify_slice(&signature).is_ok(),
        Err(_) => false,
    }
}

/// Sorted `k=v&k=v` view of callback parameters with one key left out,
/// values taken verbatim. The wallet gateway signs this shape.
pub fn sorted_pairs(params: &HashMap<String, String>, skip: &str) -> String {
    let mut keys: Vec<&String> = params.keys().filter(|k| k.as_str() != skip).collect();
    keys.sort();
    keys.iter()
        .map(|k| format!("{}={}", k, params[k.as_str()]))
        .collect::<Vec<_>>()
        .join("&")
}

/// Sorted, form-URL-encoded `k=v&k=v` string. The bank gateway uses the
/// same bytes for its redirect query and its signature payload.
pub fn sorted_encoded_pairs(params: &HashMap<String, String>, skip: &str) -> String {
    let mut keys: Vec<&String> = params.keys().filter(|k| k.as_str() != skip).collect();
    keys.sort();
    keys.iter()
        .map(|k| format!("{}={}", k, urlencoding::encode(&params[k.as_str()])))
        .collect::<Vec<_>>()
        .join("&")
}
