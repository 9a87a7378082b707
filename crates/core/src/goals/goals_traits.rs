use crate::errors::Result;
use crate::goals::goals_model::{Goal, GoalStatus, Milestone, NewGoal};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Trait for goal repository operations.
#[async_trait]
pub trait GoalRepositoryTrait: Send + Sync {
    fn get_goal(&self, goal_id: &str) -> Result<Goal>;
    fn get_goals(&self) -> Result<Vec<Goal>>;
    fn get_goals_by_family_id(&self, family_id: &str) -> Result<Vec<Goal>>;
    /// Milestones for a goal, ordered by their evaluation position.
    fn get_milestones(&self, goal_id: &str) -> Result<Vec<Milestone>>;
    async fn insert_new_goal(&self, new_goal: NewGoal) -> Result<Goal>;
    async fn update_goal_status(&self, goal_id: &str, status: GoalStatus) -> Result<Goal>;
    /// Sets `achieved_at` on a milestone, only if it is currently unset.
    /// Returns the updated milestone when this call performed the transition,
    /// `None` when it was already achieved (a racing evaluation got there
    /// first). `achieved_at` is never overwritten.
    async fn mark_milestone_achieved(
        &self,
        milestone_id: &str,
        achieved_at: DateTime<Utc>,
    ) -> Result<Option<Milestone>>;
    /// Transitions a goal to COMPLETED, only if it is not already completed.
    /// Returns true when this call performed the transition.
    async fn complete_goal(&self, goal_id: &str, completed_at: DateTime<Utc>) -> Result<bool>;
    /// Refreshes the cached `current_value` materialized from the ledger.
    async fn update_cached_value(&self, goal_id: &str, current_value: i64) -> Result<()>;
}

/// Trait for goal service operations.
#[async_trait]
pub trait GoalServiceTrait: Send + Sync {
    fn get_goal(&self, goal_id: &str) -> Result<Goal>;
    fn get_goals(&self) -> Result<Vec<Goal>>;
    fn get_goals_by_family_id(&self, family_id: &str) -> Result<Vec<Goal>>;
    fn get_milestones(&self, goal_id: &str) -> Result<Vec<Milestone>>;
    async fn create_goal(&self, new_goal: NewGoal) -> Result<Goal>;
    async fn set_status(&self, goal_id: &str, status: GoalStatus) -> Result<Goal>;
}
