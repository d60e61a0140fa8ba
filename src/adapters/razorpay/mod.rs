//! Razorpay gateway adapter.

mod adapter;
mod mock;
mod wire;

pub use adapter::{to_minor_units, RazorpayAdapter, RazorpayConfig};
pub use mock::MockGateway;
