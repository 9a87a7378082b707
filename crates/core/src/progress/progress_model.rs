//! Progress domain models - derived views over the ledger.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_ETA_WINDOW_DAYS;
use crate::goals::{GoalStatus, Milestone};
use crate::ledger::ActionType;

/// Per-contributor attribution for a goal, recomputed from the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContributorSummary {
    pub user_id: String,
    /// Net amount contributed in minor units (refunds and adjustments
    /// attributed to the user are netted in).
    pub total_contributed: i64,
    /// Share of the sum of positive contributor totals, 0 for users at or
    /// below zero.
    pub percentage_of_total: f64,
}

/// Result of folding a goal's ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressTotals {
    pub current_value: i64,
    /// May exceed 100 when over-funded; reported, not clamped, so callers
    /// can detect overshoot.
    pub percentage: f64,
    pub contributors: Vec<ContributorSummary>,
}

/// Configuration for the ETA estimator.
#[derive(Debug, Clone, Copy)]
pub struct EtaConfig {
    /// Trailing window, in days, over which velocity is measured.
    pub window_days: i64,
}

impl Default for EtaConfig {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_ETA_WINDOW_DAYS,
        }
    }
}

/// Projected completion derived from recent contribution velocity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EtaEstimate {
    /// `None` when the goal is stalled, shrinking, or already at target.
    /// Never a past date.
    pub estimated_completion_date: Option<NaiveDate>,
    /// Minor units per day over the trailing window; never negative.
    pub daily_average_contribution: Decimal,
}

impl EtaEstimate {
    pub fn stalled() -> Self {
        Self {
            estimated_completion_date: None,
            daily_average_contribution: Decimal::ZERO,
        }
    }
}

/// A value-affecting request against a goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressMutation {
    pub action_type: ActionType,
    /// Signed amount in minor units.
    pub amount: i64,
    /// Authenticated user, supplied by the auth collaborator.
    pub user_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Consolidated result of a successful mutation, returned to the caller and
/// mirrored in the single emitted domain event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub goal_id: String,
    pub current_value: i64,
    pub percentage: f64,
    /// Milestones achieved by this mutation, ascending by order.
    pub newly_achieved_milestones: Vec<Milestone>,
    pub completed: bool,
    pub estimated_completion_date: Option<NaiveDate>,
    pub daily_average_contribution: Decimal,
}

/// Full derived snapshot of a goal's progress, rebuilt from the ledger on
/// every read (tolerates cache misses by construction).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub goal_id: String,
    pub target_value: i64,
    pub current_value: i64,
    pub percentage: f64,
    pub status: GoalStatus,
    pub contributors: Vec<ContributorSummary>,
    pub milestones: Vec<Milestone>,
    pub estimated_completion_date: Option<NaiveDate>,
    pub daily_average_contribution: Decimal,
}
