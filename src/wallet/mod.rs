//! Wallet domain module
//!
//! Ledger rows written alongside rental transitions and the balances derived
//! from them.

mod model;
mod service;

pub use model::*;
pub use service::{record_transaction, WalletService};
