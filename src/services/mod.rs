//! Services Layer
//!
//! Loan lifecycle and reporting logic kept out of the HTTP handlers.
//! Every function takes the database connection and, where dates matter,
//! the current day.

pub mod loan_service;
pub mod report_service;

pub use loan_service::{Classification, LoanReceipt, RenewalReceipt, ReturnReceipt};
pub use report_service::{ActiveLoanEntry, HistoryEntry, PatronStats, ReaderReportEntry, TimelineEntry};
