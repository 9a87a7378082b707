//! ETA estimator - projects a completion date from contribution velocity.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::constants::RATE_DECIMAL_PLACES;
use crate::ledger::ProgressLogEntry;
use crate::progress::progress_model::{EtaConfig, EtaEstimate};

/// Estimates the completion date for a goal from its recent ledger.
///
/// Velocity is the sum of positive contribution-type amounts inside the
/// trailing window divided by the elapsed days in that window. Refunds and
/// adjustments move the value but are excluded from the signal so a one-off
/// correction does not understate a family's pace. The elapsed-day
/// denominator is the age of the oldest in-window entry, clamped to
/// `[1, window_days]`: a goal younger than the window is measured over its
/// own life, and a same-day burst does not divide by zero.
///
/// Returns a `None` date when velocity is zero or the target is already
/// reached; the returned date is always strictly after `now`.
pub fn estimate(
    entries: &[ProgressLogEntry],
    target_value: i64,
    current_value: i64,
    now: DateTime<Utc>,
    config: &EtaConfig,
) -> EtaEstimate {
    let window_days = config.window_days.max(1);
    let window_start = now - Duration::days(window_days);

    let mut total: i64 = 0;
    let mut oldest: Option<DateTime<Utc>> = None;
    for entry in entries {
        if entry.created_at < window_start || entry.created_at > now {
            continue;
        }
        if !entry.action_type.counts_toward_velocity() || entry.amount <= 0 {
            continue;
        }
        total += entry.amount;
        if oldest.map_or(true, |o| entry.created_at < o) {
            oldest = Some(entry.created_at);
        }
    }

    if total <= 0 {
        return EtaEstimate::stalled();
    }

    let elapsed_days = oldest
        .map(|o| (now - o).num_days())
        .unwrap_or(window_days)
        .clamp(1, window_days);
    let daily_average =
        (Decimal::from(total) / Decimal::from(elapsed_days)).round_dp(RATE_DECIMAL_PLACES);

    let remaining = target_value - current_value;
    if remaining <= 0 || daily_average <= Decimal::ZERO {
        return EtaEstimate {
            estimated_completion_date: None,
            daily_average_contribution: daily_average.max(Decimal::ZERO),
        };
    }

    let days_needed = (Decimal::from(remaining) / daily_average)
        .ceil()
        .to_i64()
        .map(|d| d.max(1));

    EtaEstimate {
        estimated_completion_date: days_needed
            .map(|days| (now + Duration::days(days)).date_naive()),
        daily_average_contribution: daily_average,
    }
}
