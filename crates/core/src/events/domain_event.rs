//! Domain event types.

use serde::{Deserialize, Serialize};

/// Domain events emitted by core services after successful mutations.
///
/// These events represent facts about domain data changes. Runtime adapters
/// translate them into platform-specific actions (notification delivery,
/// activity feed updates, client cache refresh).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A goal's derived progress changed. Emitted exactly once per committed
    /// mutation, even when that mutation achieved several milestones.
    ProgressUpdated {
        goal_id: String,
        current_value: i64,
        percentage: f64,
        newly_achieved_milestone_ids: Vec<String>,
        completed: bool,
    },

    /// Goals were created or their status changed.
    GoalsChanged { goal_ids: Vec<String> },
}

impl DomainEvent {
    /// Creates a ProgressUpdated event.
    pub fn progress_updated(
        goal_id: String,
        current_value: i64,
        percentage: f64,
        newly_achieved_milestone_ids: Vec<String>,
        completed: bool,
    ) -> Self {
        Self::ProgressUpdated {
            goal_id,
            current_value,
            percentage,
            newly_achieved_milestone_ids,
            completed,
        }
    }

    /// Creates a GoalsChanged event.
    pub fn goals_changed(goal_ids: Vec<String>) -> Self {
        Self::GoalsChanged { goal_ids }
    }
}
