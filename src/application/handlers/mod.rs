//! Command and query handlers, grouped by subsystem.

pub mod loyalty;
pub mod settlement;
pub mod subscription;
