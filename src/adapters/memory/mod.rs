//! In-memory adapters for tests and local development.

mod invoices;
mod ledger;
mod loyalty;

pub use invoices::MemoryInvoiceReader;
pub use ledger::MemoryLedger;
pub use loyalty::MemoryLoyaltyStore;
