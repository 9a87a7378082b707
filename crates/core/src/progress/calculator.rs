//! Progress calculator - pure fold of a goal's ledger into derived totals.
//!
//! Deterministic and replayable: the same entry sequence always produces the
//! same result, which is what makes the materialized `current_value` on the
//! goal row rebuildable and auditable. All summation happens in integer minor
//! units; floats appear only in the reported percentages.

use std::collections::BTreeMap;

use crate::ledger::ProgressLogEntry;
use crate::progress::progress_model::{ContributorSummary, ProgressTotals};

/// Folds ledger entries (in sequence order) into the current value,
/// percentage of target, and per-contributor attribution.
pub fn fold(entries: &[ProgressLogEntry], target_value: i64) -> ProgressTotals {
    let mut current_value: i64 = 0;
    let mut per_user: BTreeMap<&str, i64> = BTreeMap::new();

    for entry in entries {
        current_value += entry.amount;
        if entry.action_type.is_caller_suppliable() {
            *per_user.entry(entry.user_id.as_str()).or_insert(0) += entry.amount;
        }
    }

    let positive_total: i64 = per_user.values().filter(|v| **v > 0).sum();
    let contributors = per_user
        .into_iter()
        .map(|(user_id, total)| ContributorSummary {
            user_id: user_id.to_string(),
            total_contributed: total,
            percentage_of_total: if total > 0 && positive_total > 0 {
                total as f64 / positive_total as f64 * 100.0
            } else {
                0.0
            },
        })
        .collect();

    ProgressTotals {
        current_value,
        percentage: percentage_of(current_value, target_value),
        contributors,
    }
}

/// Percentage of target for display. Over-funded goals report above 100;
/// a non-positive target reports 0.
pub fn percentage_of(current_value: i64, target_value: i64) -> f64 {
    if target_value <= 0 {
        return 0.0;
    }
    current_value as f64 / target_value as f64 * 100.0
}
