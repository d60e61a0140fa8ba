//! Domain layer: pure aggregates, value objects, and financial rules.
//!
//! No I/O happens here; persistence and gateway effects live behind the
//! ports.

pub mod foundation;
pub mod loyalty;
pub mod payment;
pub mod subscription;
