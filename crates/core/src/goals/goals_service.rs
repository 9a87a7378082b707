use std::sync::Arc;

use async_trait::async_trait;
use log::debug;

use crate::errors::{Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink};
use crate::goals::goals_model::{Goal, GoalStatus, Milestone, NewGoal};
use crate::goals::goals_traits::{GoalRepositoryTrait, GoalServiceTrait};

/// Service for managing goals and their milestone definitions.
pub struct GoalService {
    goal_repository: Arc<dyn GoalRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl GoalService {
    /// Creates a new GoalService instance with injected dependencies.
    pub fn new(
        goal_repository: Arc<dyn GoalRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self {
            goal_repository,
            event_sink,
        }
    }

    /// Validates a new goal before it reaches the repository: positive
    /// target, and milestone thresholds strictly increasing in list order
    /// without exceeding the goal target.
    fn validate_new_goal(new_goal: &NewGoal) -> Result<()> {
        if new_goal.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title".to_string()).into());
        }
        if new_goal.currency.trim().is_empty() {
            return Err(ValidationError::MissingField("currency".to_string()).into());
        }
        if new_goal.target_value <= 0 {
            return Err(ValidationError::InvalidInput(
                "Goal target value must be positive".to_string(),
            )
            .into());
        }
        if matches!(new_goal.status, GoalStatus::Completed) {
            return Err(ValidationError::InvalidInput(
                "A goal cannot be created in COMPLETED status".to_string(),
            )
            .into());
        }

        let mut previous: Option<i64> = None;
        for milestone in &new_goal.milestones {
            if milestone.target_value <= 0 {
                return Err(ValidationError::InvalidInput(
                    "Milestone target value must be positive".to_string(),
                )
                .into());
            }
            if milestone.target_value > new_goal.target_value {
                return Err(ValidationError::InvalidInput(format!(
                    "Milestone target {} exceeds goal target {}",
                    milestone.target_value, new_goal.target_value
                ))
                .into());
            }
            if let Some(prev) = previous {
                if milestone.target_value <= prev {
                    return Err(ValidationError::InvalidInput(format!(
                        "Milestone targets must strictly increase: {} after {}",
                        milestone.target_value, prev
                    ))
                    .into());
                }
            }
            previous = Some(milestone.target_value);
        }
        Ok(())
    }
}

#[async_trait]
impl GoalServiceTrait for GoalService {
    fn get_goal(&self, goal_id: &str) -> Result<Goal> {
        self.goal_repository.get_goal(goal_id)
    }

    fn get_goals(&self) -> Result<Vec<Goal>> {
        self.goal_repository.get_goals()
    }

    fn get_goals_by_family_id(&self, family_id: &str) -> Result<Vec<Goal>> {
        self.goal_repository.get_goals_by_family_id(family_id)
    }

    fn get_milestones(&self, goal_id: &str) -> Result<Vec<Milestone>> {
        self.goal_repository.get_milestones(goal_id)
    }

    async fn create_goal(&self, new_goal: NewGoal) -> Result<Goal> {
        Self::validate_new_goal(&new_goal)?;
        let goal = self.goal_repository.insert_new_goal(new_goal).await?;
        debug!("Created goal {} for family {}", goal.id, goal.family_id);
        self.event_sink
            .emit(DomainEvent::goals_changed(vec![goal.id.clone()]));
        Ok(goal)
    }

    async fn set_status(&self, goal_id: &str, status: GoalStatus) -> Result<Goal> {
        // Completion is driven by the progress engine, never set directly.
        if matches!(status, GoalStatus::Completed) {
            return Err(ValidationError::InvalidInput(
                "COMPLETED is set by the progress engine, not by status updates".to_string(),
            )
            .into());
        }
        let current = self.goal_repository.get_goal(goal_id)?;
        if matches!(current.status, GoalStatus::Completed) {
            return Err(ValidationError::InvalidInput(
                "Completed goals cannot change status".to_string(),
            )
            .into());
        }
        let goal = self
            .goal_repository
            .update_goal_status(goal_id, status)
            .await?;
        self.event_sink
            .emit(DomainEvent::goals_changed(vec![goal.id.clone()]));
        Ok(goal)
    }
}
