//! HTTP handlers for the Stock Ledger API

mod health;
mod inventory;
mod product;
mod transaction;

pub use health::*;
pub use inventory::*;
pub use product::*;
pub use transaction::*;
