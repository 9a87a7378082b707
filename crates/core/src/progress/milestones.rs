//! Milestone evaluator - diffs the current value against ordered thresholds.

use std::collections::HashSet;

use crate::goals::Milestone;

/// Returns the milestones newly achieved at `current_value`, ascending by
/// `order`.
///
/// A milestone is newly achieved when its id is not in `previously_achieved`
/// and its threshold is at or below the current value. A single contribution
/// crossing several thresholds reports all of them in one evaluation, never
/// skipped or merged. Re-running with the same value and an updated
/// `previously_achieved` set yields nothing, which is what makes achievement
/// emission idempotent.
pub fn evaluate(
    current_value: i64,
    milestones: &[Milestone],
    previously_achieved: &HashSet<String>,
) -> Vec<Milestone> {
    let mut newly: Vec<Milestone> = milestones
        .iter()
        .filter(|m| !previously_achieved.contains(&m.id) && m.target_value <= current_value)
        .cloned()
        .collect();
    newly.sort_by_key(|m| m.order);
    newly
}
