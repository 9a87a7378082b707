//! Progress module - the goal-progress engine.
//!
//! `calculator`, `milestones` and `eta` are pure functions of ledger state;
//! `ProgressService` orchestrates them around the write-ahead ledger append.

pub mod calculator;
pub mod eta;
pub mod milestones;
mod progress_model;
mod progress_service;
mod progress_traits;

#[cfg(test)]
mod progress_service_tests;

pub use progress_model::{
    ContributorSummary, EtaConfig, EtaEstimate, ProgressMutation, ProgressSnapshot,
    ProgressTotals, ProgressUpdate,
};
pub use progress_service::ProgressService;
pub use progress_traits::ProgressServiceTrait;
