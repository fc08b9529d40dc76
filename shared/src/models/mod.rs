//! Domain models for the Stock Ledger

mod dashboard;
mod inventory;
mod product;

pub use dashboard::*;
pub use inventory::*;
pub use product::*;
