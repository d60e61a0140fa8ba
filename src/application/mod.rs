//! Application layer: orchestrates domain logic through the ports.

pub mod handlers;
