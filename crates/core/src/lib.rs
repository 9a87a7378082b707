//! Nestfund Core - Domain entities, services, and traits.
//!
//! This crate contains the goal-progress engine for Nestfund: the append-only
//! progress ledger, the pure calculators that fold it into derived state, and
//! the orchestrating services. It is database-agnostic and defines traits that
//! are implemented by the `storage-sqlite` crate.

pub mod constants;
pub mod errors;
pub mod events;
pub mod goals;
pub mod ledger;
pub mod progress;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
