use crate::errors::Result;
use crate::ledger::ledger_model::{LedgerHead, NewProgressLogEntry, ProgressLogEntry};
use async_trait::async_trait;

/// Trait defining the contract for progress ledger storage.
///
/// `append` is the only mutation path for goal values; there is no update or
/// delete. Entries are ordered by the per-goal `sequence` assigned on append.
#[async_trait]
pub trait LedgerRepositoryTrait: Send + Sync {
    /// Appends an entry, assigning `sequence = head.sequence + 1`.
    ///
    /// Fails with `Error::Conflict` when `expected_previous_value` does not
    /// match the stored head value (another writer got there first). The
    /// caller owns the retry policy.
    async fn append(&self, entry: NewProgressLogEntry) -> Result<ProgressLogEntry>;

    /// All entries for a goal in sequence order.
    fn list_entries(&self, goal_id: &str) -> Result<Vec<ProgressLogEntry>>;

    /// Entries with `sequence > cursor`, in sequence order.
    fn list_since(&self, goal_id: &str, cursor: i64) -> Result<Vec<ProgressLogEntry>>;

    /// Current head; the zero head for an empty ledger.
    fn head(&self, goal_id: &str) -> Result<LedgerHead>;
}
