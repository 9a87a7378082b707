use crate::errors::Result;
use crate::ledger::ProgressLogEntry;
use crate::progress::progress_model::{ProgressMutation, ProgressSnapshot, ProgressUpdate};
use async_trait::async_trait;

/// Trait defining the contract for progress orchestration.
#[async_trait]
pub trait ProgressServiceTrait: Send + Sync {
    /// Applies a value-affecting mutation to a goal: validates, appends to
    /// the ledger (retrying bounded times on head conflicts), re-derives
    /// progress, achieves milestones and completion exactly once, and emits
    /// one consolidated domain event.
    async fn apply_ledger_event(
        &self,
        goal_id: &str,
        mutation: ProgressMutation,
    ) -> Result<ProgressUpdate>;

    /// Derived snapshot for a goal, recomputed from the ledger.
    fn get_progress(&self, goal_id: &str) -> Result<ProgressSnapshot>;

    /// The goal's full ledger in sequence order, for audit and rebuild.
    fn get_ledger(&self, goal_id: &str) -> Result<Vec<ProgressLogEntry>>;
}
