//! Shared types and models for the Stock Ledger
//!
//! This crate contains the domain models and the inventory ledger rules shared
//! between the backend and the dashboard client (via WASM).

pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use ledger::*;
pub use models::*;
pub use types::*;
pub use validation::*;
