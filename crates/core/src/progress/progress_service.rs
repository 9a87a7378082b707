use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};

use crate::constants::MAX_APPEND_RETRIES;
use crate::errors::{Error, Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink};
use crate::goals::{Goal, GoalRepositoryTrait, GoalStatus, Milestone};
use crate::ledger::{ActionType, LedgerRepositoryTrait, NewProgressLogEntry, ProgressLogEntry};
use crate::progress::calculator;
use crate::progress::eta;
use crate::progress::milestones;
use crate::progress::progress_model::{
    EtaConfig, ProgressMutation, ProgressSnapshot, ProgressTotals, ProgressUpdate,
};
use crate::progress::progress_traits::ProgressServiceTrait;

/// Orchestrates the progress engine: write-ahead ledger append, fold,
/// milestone evaluation, completion, ETA, and a single consolidated event
/// per mutation.
pub struct ProgressService {
    ledger_repository: Arc<dyn LedgerRepositoryTrait>,
    goal_repository: Arc<dyn GoalRepositoryTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    eta_config: EtaConfig,
}

impl ProgressService {
    /// Creates a new ProgressService instance with injected dependencies.
    pub fn new(
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
        goal_repository: Arc<dyn GoalRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
    ) -> Self {
        Self::with_eta_config(
            ledger_repository,
            goal_repository,
            event_sink,
            EtaConfig::default(),
        )
    }

    pub fn with_eta_config(
        ledger_repository: Arc<dyn LedgerRepositoryTrait>,
        goal_repository: Arc<dyn GoalRepositoryTrait>,
        event_sink: Arc<dyn DomainEventSink>,
        eta_config: EtaConfig,
    ) -> Self {
        Self {
            ledger_repository,
            goal_repository,
            event_sink,
            eta_config,
        }
    }

    fn validate_mutation(goal: &Goal, mutation: &ProgressMutation) -> Result<()> {
        if mutation.user_id.trim().is_empty() {
            return Err(ValidationError::MissingField("user_id".to_string()).into());
        }
        if !mutation.action_type.is_caller_suppliable() {
            return Err(ValidationError::InvalidInput(format!(
                "Action type {} is written by the engine and cannot be submitted",
                mutation.action_type.as_db_str()
            ))
            .into());
        }
        mutation.action_type.validate_amount(mutation.amount)?;
        if !goal.status.accepts_mutations() {
            return Err(ValidationError::InvalidInput(format!(
                "Goal {} does not accept progress in status {}",
                goal.id,
                goal.status.as_db_str()
            ))
            .into());
        }
        Ok(())
    }

    /// Appends an entry with a fresh head on each attempt. Conflicts are
    /// retried up to the bound, then surfaced as stale state so the caller
    /// re-fetches before resubmitting.
    async fn append_with_retries(
        &self,
        goal_id: &str,
        user_id: &str,
        action_type: ActionType,
        amount: i64,
        milestone_id: Option<String>,
        reason: Option<String>,
    ) -> Result<ProgressLogEntry> {
        for attempt in 1..=MAX_APPEND_RETRIES {
            let head = self.ledger_repository.head(goal_id)?;
            let entry = NewProgressLogEntry {
                goal_id: goal_id.to_string(),
                user_id: user_id.to_string(),
                action_type,
                amount,
                expected_previous_value: head.value,
                milestone_id: milestone_id.clone(),
                reason: reason.clone(),
            };
            match self.ledger_repository.append(entry).await {
                Ok(appended) => return Ok(appended),
                Err(err) if err.is_conflict() => {
                    debug!(
                        "Ledger head moved for goal {goal_id} (attempt {attempt}/{MAX_APPEND_RETRIES}): {err}"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Err(Error::StaleState(format!(
            "Ledger head for goal {goal_id} kept moving after {MAX_APPEND_RETRIES} attempts"
        )))
    }

    /// Marks newly crossed milestones as achieved, exactly once each, and
    /// records a MILESTONE_ACHIEVED ledger entry per achievement. A milestone
    /// claimed by a racing evaluation is skipped without an entry.
    ///
    /// Runs after the caller's entry has committed, so failures here must not
    /// fail the mutation. A failed mark leaves `achieved_at` unset and the
    /// next evaluation re-attempts it; a failed append after a successful
    /// mark is logged, and the achievement still reaches the caller and the
    /// event sink.
    async fn achieve_milestones(
        &self,
        goal_id: &str,
        user_id: &str,
        newly: Vec<Milestone>,
    ) -> Vec<Milestone> {
        let now = Utc::now();
        let mut achieved = Vec::with_capacity(newly.len());
        for milestone in newly {
            match self
                .goal_repository
                .mark_milestone_achieved(&milestone.id, now)
                .await
            {
                Ok(Some(stored)) => {
                    if let Err(err) = self
                        .append_with_retries(
                            goal_id,
                            user_id,
                            ActionType::MilestoneAchieved,
                            0,
                            Some(stored.id.clone()),
                            None,
                        )
                        .await
                    {
                        warn!(
                            "Failed to record achievement entry for milestone {} on goal {goal_id}: {err}",
                            stored.id
                        );
                    }
                    achieved.push(stored);
                }
                Ok(None) => {
                    debug!(
                        "Milestone {} on goal {goal_id} already achieved by a concurrent evaluation",
                        milestone.id
                    );
                }
                Err(err) => {
                    warn!(
                        "Failed to mark milestone {} on goal {goal_id} achieved: {err}",
                        milestone.id
                    );
                }
            }
        }
        achieved
    }

    fn derive(&self, goal: &Goal, entries: &[ProgressLogEntry]) -> ProgressTotals {
        calculator::fold(entries, goal.target_value)
    }
}

#[async_trait]
impl ProgressServiceTrait for ProgressService {
    async fn apply_ledger_event(
        &self,
        goal_id: &str,
        mutation: ProgressMutation,
    ) -> Result<ProgressUpdate> {
        let goal = self.goal_repository.get_goal(goal_id)?;
        Self::validate_mutation(&goal, &mutation)?;

        // Write-ahead: the ledger entry commits before any derived state is
        // touched. From here on the mutation is authoritative.
        self.append_with_retries(
            goal_id,
            &mutation.user_id,
            mutation.action_type,
            mutation.amount,
            None,
            mutation.reason.clone(),
        )
        .await?;

        let entries = self.ledger_repository.list_entries(goal_id)?;
        let totals = self.derive(&goal, &entries);

        let milestones_state = self.goal_repository.get_milestones(goal_id)?;
        let previously_achieved: HashSet<String> = milestones_state
            .iter()
            .filter(|m| m.is_achieved())
            .map(|m| m.id.clone())
            .collect();
        let newly = milestones::evaluate(totals.current_value, &milestones_state, &previously_achieved);
        let newly_achieved = self
            .achieve_milestones(goal_id, &mutation.user_id, newly)
            .await;

        // Completion fires at most once per goal; the repository guard is
        // the authority when two mutations race across the target. Like the
        // achievement entries, the transition runs after the caller's entry
        // has committed, so a failure here is logged, not surfaced.
        let mut completed = matches!(goal.status, GoalStatus::Completed);
        if totals.current_value >= goal.target_value {
            match self.goal_repository.complete_goal(goal_id, Utc::now()).await {
                Ok(true) => {
                    if let Err(err) = self
                        .append_with_retries(
                            goal_id,
                            &mutation.user_id,
                            ActionType::GoalCompleted,
                            0,
                            None,
                            None,
                        )
                        .await
                    {
                        warn!("Failed to record completion entry for goal {goal_id}: {err}");
                    }
                    completed = true;
                }
                Ok(false) => {
                    completed = true;
                }
                Err(err) => {
                    warn!("Failed to complete goal {goal_id}: {err}");
                }
            }
        }

        // The cached value is a display convenience; the ledger has already
        // committed, so a failed refresh is logged rather than surfaced.
        if let Err(err) = self
            .goal_repository
            .update_cached_value(goal_id, totals.current_value)
            .await
        {
            warn!("Failed to refresh cached value for goal {goal_id}: {err}");
        }

        let eta_estimate = eta::estimate(
            &entries,
            goal.target_value,
            totals.current_value,
            Utc::now(),
            &self.eta_config,
        );

        self.event_sink.emit(DomainEvent::progress_updated(
            goal_id.to_string(),
            totals.current_value,
            totals.percentage,
            newly_achieved.iter().map(|m| m.id.clone()).collect(),
            completed,
        ));

        Ok(ProgressUpdate {
            goal_id: goal_id.to_string(),
            current_value: totals.current_value,
            percentage: totals.percentage,
            newly_achieved_milestones: newly_achieved,
            completed,
            estimated_completion_date: eta_estimate.estimated_completion_date,
            daily_average_contribution: eta_estimate.daily_average_contribution,
        })
    }

    fn get_progress(&self, goal_id: &str) -> Result<ProgressSnapshot> {
        let goal = self.goal_repository.get_goal(goal_id)?;
        let entries = self.ledger_repository.list_entries(goal_id)?;
        let totals = self.derive(&goal, &entries);
        let milestones_state = self.goal_repository.get_milestones(goal_id)?;
        let eta_estimate = eta::estimate(
            &entries,
            goal.target_value,
            totals.current_value,
            Utc::now(),
            &self.eta_config,
        );

        Ok(ProgressSnapshot {
            goal_id: goal.id,
            target_value: goal.target_value,
            current_value: totals.current_value,
            percentage: totals.percentage,
            status: goal.status,
            contributors: totals.contributors,
            milestones: milestones_state,
            estimated_completion_date: eta_estimate.estimated_completion_date,
            daily_average_contribution: eta_estimate.daily_average_contribution,
        })
    }

    fn get_ledger(&self, goal_id: &str) -> Result<Vec<ProgressLogEntry>> {
        self.ledger_repository.list_entries(goal_id)
    }
}
