//! Tenant Ledger - Multi-tenant billing ledger subsystem
//!
//! Owns the subscription lifecycle, payment-gateway settlement, and the
//! loyalty cashback ledger for a multi-tenant billing platform.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
