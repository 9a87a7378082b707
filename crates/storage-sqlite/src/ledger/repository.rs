use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use nestfund_core::errors::{Error, Result};
use nestfund_core::ledger::{
    LedgerHead, LedgerRepositoryTrait, NewProgressLogEntry, ProgressLogEntry,
};

use super::model::ProgressLogEntryDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::progress_ledger;
use crate::utils::format_timestamp;

pub struct LedgerRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl LedgerRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        LedgerRepository { pool, writer }
    }

    fn head_row(
        conn: &mut SqliteConnection,
        goal_id: &str,
    ) -> std::result::Result<Option<ProgressLogEntryDB>, DieselError> {
        progress_ledger::table
            .filter(progress_ledger::goal_id.eq(goal_id))
            .order(progress_ledger::sequence.desc())
            .first::<ProgressLogEntryDB>(conn)
            .optional()
    }
}

#[async_trait]
impl LedgerRepositoryTrait for LedgerRepository {
    async fn append(&self, entry: NewProgressLogEntry) -> Result<ProgressLogEntry> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<ProgressLogEntry> {
                let head = Self::head_row(conn, &entry.goal_id).map_err(StorageError::from)?;
                let (head_sequence, head_value) = head
                    .map(|h| (h.sequence, h.new_value))
                    .unwrap_or((0, 0));

                // Optimistic concurrency: the caller appended against a head
                // it read earlier; if the value moved since, the write is
                // rejected and rolled back.
                if head_value != entry.expected_previous_value {
                    return Err(Error::Conflict(format!(
                        "Goal {}: expected head value {} but found {}",
                        entry.goal_id, entry.expected_previous_value, head_value
                    )));
                }

                let row = ProgressLogEntryDB {
                    id: Uuid::new_v4().to_string(),
                    goal_id: entry.goal_id.clone(),
                    user_id: entry.user_id.clone(),
                    action_type: entry.action_type.as_db_str().to_string(),
                    amount: entry.amount,
                    previous_value: head_value,
                    new_value: head_value + entry.amount,
                    sequence: head_sequence + 1,
                    milestone_id: entry.milestone_id.clone(),
                    reason: entry.reason.clone(),
                    created_at: format_timestamp(Utc::now()),
                };

                match diesel::insert_into(progress_ledger::table)
                    .values(&row)
                    .execute(conn)
                {
                    Ok(_) => ProgressLogEntry::try_from(row),
                    // A writer outside this process claimed the sequence
                    // number between our read and insert; same remedy as a
                    // head mismatch.
                    Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
                        Err(Error::Conflict(format!(
                            "Goal {}: sequence {} already written ({})",
                            entry.goal_id,
                            row.sequence,
                            info.message()
                        )))
                    }
                    Err(e) => Err(StorageError::from(e).into()),
                }
            })
            .await
    }

    fn list_entries(&self, goal_id: &str) -> Result<Vec<ProgressLogEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = progress_ledger::table
            .filter(progress_ledger::goal_id.eq(goal_id))
            .order(progress_ledger::sequence.asc())
            .load::<ProgressLogEntryDB>(&mut conn)
            .into_core()?;
        rows.into_iter().map(ProgressLogEntry::try_from).collect()
    }

    fn list_since(&self, goal_id: &str, cursor: i64) -> Result<Vec<ProgressLogEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = progress_ledger::table
            .filter(progress_ledger::goal_id.eq(goal_id))
            .filter(progress_ledger::sequence.gt(cursor))
            .order(progress_ledger::sequence.asc())
            .load::<ProgressLogEntryDB>(&mut conn)
            .into_core()?;
        rows.into_iter().map(ProgressLogEntry::try_from).collect()
    }

    fn head(&self, goal_id: &str) -> Result<LedgerHead> {
        let mut conn = get_connection(&self.pool)?;
        let head = Self::head_row(&mut conn, goal_id).into_core()?;
        Ok(head
            .map(|h| LedgerHead {
                sequence: h.sequence,
                value: h.new_value,
            })
            .unwrap_or_default())
    }
}
