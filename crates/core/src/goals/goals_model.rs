//! Goals domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// Goal lifecycle status.
///
/// `Completed` is owned by the progress engine and is set exactly once, when
/// the ledger first reaches the target. All other statuses are set by
/// collaborators (product flows, admin tooling).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalStatus {
    Draft,
    #[default]
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl GoalStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            GoalStatus::Draft => "DRAFT",
            GoalStatus::Active => "ACTIVE",
            GoalStatus::Paused => "PAUSED",
            GoalStatus::Completed => "COMPLETED",
            GoalStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "DRAFT" => Ok(GoalStatus::Draft),
            "ACTIVE" => Ok(GoalStatus::Active),
            "PAUSED" => Ok(GoalStatus::Paused),
            "COMPLETED" => Ok(GoalStatus::Completed),
            "CANCELLED" => Ok(GoalStatus::Cancelled),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown goal status: {other}"
            ))
            .into()),
        }
    }

    /// Whether the progress engine accepts value mutations in this status.
    /// Completed goals still accept contributions (over-funding is legal);
    /// draft, paused and cancelled goals do not.
    pub fn accepts_mutations(&self) -> bool {
        matches!(self, GoalStatus::Active | GoalStatus::Completed)
    }
}

/// Domain model representing a shared family goal.
///
/// `current_value` is a materialized view over the progress ledger: it is
/// cached here for display but is never written directly, only refreshed
/// from a fold of the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub family_id: String,
    pub title: String,
    pub description: Option<String>,
    pub currency: String,
    /// Target amount in minor units (e.g. cents).
    pub target_value: i64,
    /// Cached derived value in minor units; authoritative value lives in the ledger.
    pub current_value: i64,
    pub status: GoalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Domain model for a milestone threshold on a goal.
///
/// Milestones are evaluated in `order`; `target_value` strictly increases
/// with `order`. `achieved_at` is set exactly once and never unset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub goal_id: String,
    pub title: Option<String>,
    /// Threshold in minor units.
    pub target_value: i64,
    /// Evaluation position, unique per goal.
    pub order: i32,
    pub achieved_at: Option<DateTime<Utc>>,
}

impl Milestone {
    pub fn is_achieved(&self) -> bool {
        self.achieved_at.is_some()
    }
}

/// Input model for creating a new goal with its milestones.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    pub id: Option<String>,
    pub family_id: String,
    pub title: String,
    pub description: Option<String>,
    pub currency: String,
    pub target_value: i64,
    #[serde(default)]
    pub status: GoalStatus,
    #[serde(default)]
    pub milestones: Vec<NewMilestone>,
}

/// Input model for a milestone on a new goal. Order is taken from the
/// position in the submitted list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMilestone {
    pub title: Option<String>,
    pub target_value: i64,
}
