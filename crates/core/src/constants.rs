/// Maximum number of times a mutation is retried after a ledger head conflict
/// before the operation is surfaced as stale.
pub const MAX_APPEND_RETRIES: u32 = 3;

/// Default trailing window, in days, over which contribution velocity is
/// measured for ETA projection.
pub const DEFAULT_ETA_WINDOW_DAYS: i64 = 30;

/// Display decimal places for monetary rates (minor units per day).
pub const RATE_DECIMAL_PLACES: u32 = 2;
