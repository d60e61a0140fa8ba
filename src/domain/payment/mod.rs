//! Payment domain: the payment aggregate, its settlement state machine, and
//! gateway callback signature verification.

#[allow(clippy::module_inception)]
mod payment;
mod signature;
mod status;

pub use payment::Payment;
pub use signature::{compute_payment_signature, verify_payment_signature};
pub use status::PaymentStatus;
