//! Progress ledger domain models.
//!
//! The ledger is the single source of truth for a goal's value: an
//! append-only, per-goal sequence of signed minor-unit amounts. Every derived
//! number (current value, percentage, milestone state) is a fold over it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// The action recorded by a ledger entry.
///
/// `Contribution`, `ManualAdjustment` and `Refund` are caller-supplied;
/// `MilestoneAchieved` and `GoalCompleted` are emitted by the engine itself
/// with amount 0, so the running sum stays intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Contribution,
    MilestoneAchieved,
    ManualAdjustment,
    Refund,
    GoalCompleted,
}

impl ActionType {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ActionType::Contribution => "CONTRIBUTION",
            ActionType::MilestoneAchieved => "MILESTONE_ACHIEVED",
            ActionType::ManualAdjustment => "MANUAL_ADJUSTMENT",
            ActionType::Refund => "REFUND",
            ActionType::GoalCompleted => "GOAL_COMPLETED",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "CONTRIBUTION" => Ok(ActionType::Contribution),
            "MILESTONE_ACHIEVED" => Ok(ActionType::MilestoneAchieved),
            "MANUAL_ADJUSTMENT" => Ok(ActionType::ManualAdjustment),
            "REFUND" => Ok(ActionType::Refund),
            "GOAL_COMPLETED" => Ok(ActionType::GoalCompleted),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown action type: {other}"
            ))
            .into()),
        }
    }

    /// Whether callers may submit this action type through the API.
    /// The remaining types are written by the engine only.
    pub fn is_caller_suppliable(&self) -> bool {
        matches!(
            self,
            ActionType::Contribution | ActionType::ManualAdjustment | ActionType::Refund
        )
    }

    /// Validates the amount sign convention for this action type:
    /// contributions strictly positive, refunds strictly negative, manual
    /// adjustments signed either way but never zero, engine-emitted entries
    /// always zero.
    pub fn validate_amount(&self, amount: i64) -> Result<()> {
        let valid = match self {
            ActionType::Contribution => amount > 0,
            ActionType::Refund => amount < 0,
            ActionType::ManualAdjustment => amount != 0,
            ActionType::MilestoneAchieved | ActionType::GoalCompleted => amount == 0,
        };
        if valid {
            Ok(())
        } else {
            Err(ValidationError::AmountSign {
                action_type: self.as_db_str().to_string(),
                amount,
            }
            .into())
        }
    }

    /// Whether this entry type feeds the contribution velocity signal.
    /// Refunds and adjustments move the value but deliberately do not
    /// understate pace.
    pub fn counts_toward_velocity(&self) -> bool {
        matches!(self, ActionType::Contribution | ActionType::MilestoneAchieved)
    }
}

/// An immutable entry in a goal's progress ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressLogEntry {
    pub id: String,
    pub goal_id: String,
    pub user_id: String,
    pub action_type: ActionType,
    /// Signed amount in minor units.
    pub amount: i64,
    pub previous_value: i64,
    pub new_value: i64,
    /// Monotonic per-goal position; the ordering authority (not wall clock).
    pub sequence: i64,
    /// Set on MILESTONE_ACHIEVED entries.
    pub milestone_id: Option<String>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input model for appending a ledger entry.
///
/// `expected_previous_value` is the optimistic concurrency token: the append
/// fails with a conflict when it no longer matches the stored head value.
#[derive(Debug, Clone)]
pub struct NewProgressLogEntry {
    pub goal_id: String,
    pub user_id: String,
    pub action_type: ActionType,
    pub amount: i64,
    pub expected_previous_value: i64,
    pub milestone_id: Option<String>,
    pub reason: Option<String>,
}

impl NewProgressLogEntry {
    pub fn new_value(&self) -> i64 {
        self.expected_previous_value + self.amount
    }
}

/// The head of a goal's ledger: last assigned sequence and the running value.
/// An empty ledger has the zero head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LedgerHead {
    pub sequence: i64,
    pub value: i64,
}
