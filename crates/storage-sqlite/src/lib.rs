//! SQLite storage implementation for Nestfund.
//!
//! This crate provides all database-related functionality using Diesel ORM
//! with SQLite. It implements the repository traits defined in
//! `nestfund-core` and contains:
//! - Database connection pooling and management
//! - Diesel migrations
//! - Repository implementations for goals and the progress ledger
//! - Database-specific model types (with Diesel derives)
//!
//! # Architecture
//!
//! This crate is the only place in the application where Diesel dependencies
//! exist. Every other crate is database-agnostic and works with traits.
//!
//! All writes flow through a single writer actor holding one connection, so
//! same-goal ledger appends are serialized in-process; the optimistic
//! head check inside `LedgerRepository::append` still guards against any
//! other writer to the same database file.

pub mod db;
pub mod errors;
pub mod schema;
pub mod utils;

// Repository implementations
pub mod goals;
pub mod ledger;

// Re-export database utilities
pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

// Re-export from nestfund-core for convenience
pub use nestfund_core::errors::{DatabaseError, Error, Result};
