//! Progress ledger module - append-only event records and storage contract.

mod ledger_model;
mod ledger_traits;

pub use ledger_model::{ActionType, LedgerHead, NewProgressLogEntry, ProgressLogEntry};
pub use ledger_traits::LedgerRepositoryTrait;
