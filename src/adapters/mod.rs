//! Adapters - concrete implementations of the ports.

pub mod cache;
pub mod memory;
pub mod postgres;
pub mod razorpay;
