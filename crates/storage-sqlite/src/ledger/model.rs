//! Database models for the progress ledger.

use diesel::prelude::*;

use nestfund_core::ledger::{ActionType, ProgressLogEntry};
use nestfund_core::Error;

use crate::utils::parse_timestamp_tolerant;

/// Database model for ledger entries. Rows are insert-only; there is no
/// changeset type because entries are immutable once written.
#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::progress_ledger)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ProgressLogEntryDB {
    pub id: String,
    pub goal_id: String,
    pub user_id: String,
    pub action_type: String,
    pub amount: i64,
    pub previous_value: i64,
    pub new_value: i64,
    pub sequence: i64,
    pub milestone_id: Option<String>,
    pub reason: Option<String>,
    pub created_at: String,
}

impl TryFrom<ProgressLogEntryDB> for ProgressLogEntry {
    type Error = Error;

    fn try_from(db: ProgressLogEntryDB) -> Result<Self, Error> {
        Ok(Self {
            action_type: ActionType::parse(&db.action_type)?,
            id: db.id,
            goal_id: db.goal_id,
            user_id: db.user_id,
            amount: db.amount,
            previous_value: db.previous_value,
            new_value: db.new_value,
            sequence: db.sequence,
            milestone_id: db.milestone_id,
            reason: db.reason,
            created_at: parse_timestamp_tolerant(&db.created_at, "progress_ledger.created_at"),
        })
    }
}
