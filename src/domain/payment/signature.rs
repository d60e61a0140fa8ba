//! Gateway callback signature verification.
//!
//! The gateway signs client-driven payment confirmations with HMAC-SHA256
//! over `order_id|payment_id`. Verification never errors: any malformed or
//! mismatched signature reads as false, and callers must treat false as
//! "reject, no state change".

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Verifies a payment confirmation signature.
///
/// Recomputes HMAC-SHA256 over `{order_id}|{payment_id}` with the gateway
/// key secret and compares against the hex-encoded `signature` in constant
/// time. Returns false on any mismatch or malformed input.
pub fn verify_payment_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> bool {
    let provided = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    let expected = mac.finalize().into_bytes();

    constant_time_compare(expected.as_slice(), &provided)
}

/// Constant-time comparison of two byte slices.
///
/// Prevents timing attacks that could leak the expected signature.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes the hex signature the gateway would produce.
///
/// Used by the mock gateway and test fixtures.
pub fn compute_payment_signature(secret: &str, order_id: &str, payment_id: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
