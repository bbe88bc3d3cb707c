//! RNS Registrar
//!
//! Sells the children of a root node through sealed bids or direct
//! registration, renews them, and collects rent. All payments are pulled from
//! the payer through a [`TokenLedger`] allowance; ownership changes are
//! written to the shared authority registry.

pub mod config;
pub mod errors;
pub mod ledger;
pub mod registrar;
pub mod types;

pub use config::RegistrarConfig;
pub use errors::*;
pub use ledger::{InMemoryTokenLedger, LedgerError, TokenLedger, TransferRecord};
pub use registrar::Registrar;
pub use types::*;
