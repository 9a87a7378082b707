//! Progress ledger storage.

mod model;
mod repository;

pub use model::ProgressLogEntryDB;
pub use repository::LedgerRepository;
