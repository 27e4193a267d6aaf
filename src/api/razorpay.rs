// src/api/razorpay.rs

use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Outcome of a checkout-callback signature check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationResult {
    Authentic,
    Forged,
}

/// HMAC-SHA256 in hex. Razorpay signs checkout callbacks with the key
/// secret over `"{order_id}|{payment_id}"`.
pub fn sign_hmac_sha256_hex(secret: &str, data: &str) -> String {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(data.as_bytes());
    let result = mac.finalize().into_bytes();
    hex::encode(result)
}

/// Recomputes the expected signature for `(order_id, payment_id)` and
/// compares it against the caller-supplied one. The comparison must be
/// constant-time; the secret stays server-side.
pub fn verify_payment_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    supplied_signature: &str,
) -> VerificationResult {
    let expected = sign_hmac_sha256_hex(secret, &format!("{order_id}|{payment_id}"));

    if constant_time_eq(expected.as_bytes(), supplied_signature.as_bytes()) {
        VerificationResult::Authentic
    } else {
        VerificationResult::Forged
    }
}
