//! Business logic services for the Stock Ledger

pub mod ledger;
pub mod product;
pub mod reporting;

pub use ledger::LedgerService;
pub use product::ProductService;
pub use reporting::ReportingService;
