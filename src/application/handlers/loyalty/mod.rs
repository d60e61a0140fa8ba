//! Loyalty ledger handlers.

mod calculate_cashback;
mod get_program_statistics;
mod process_invoice;
mod redeem_cashback;

pub use calculate_cashback::{CalculateCashbackHandler, CalculateCashbackQuery, CashbackQuote};
pub use get_program_statistics::{
    GetProgramStatisticsHandler, GetProgramStatisticsQuery, ProgramStatisticsResult,
};
pub use process_invoice::{ProcessInvoiceCommand, ProcessInvoiceHandler, ProcessInvoiceOutcome};
pub use redeem_cashback::{RedeemCashbackCommand, RedeemCashbackHandler, RedeemCashbackResult};
