use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use nestfund_core::goals::{Goal, GoalRepositoryTrait, GoalStatus, Milestone, NewGoal};
use nestfund_core::errors::{DatabaseError, Result};

use super::model::{GoalDB, MilestoneDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::{goals, milestones};
use crate::utils::format_timestamp;

pub struct GoalRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl GoalRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        GoalRepository { pool, writer }
    }

    fn load_goal(conn: &mut SqliteConnection, goal_id: &str) -> Result<Goal> {
        let goal_db = goals::table
            .find(goal_id)
            .first::<GoalDB>(conn)
            .into_core()?;
        Goal::try_from(goal_db)
    }
}

#[async_trait]
impl GoalRepositoryTrait for GoalRepository {
    fn get_goal(&self, goal_id: &str) -> Result<Goal> {
        let mut conn = get_connection(&self.pool)?;
        Self::load_goal(&mut conn, goal_id)
    }

    fn get_goals(&self) -> Result<Vec<Goal>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = goals::table.load::<GoalDB>(&mut conn).into_core()?;
        rows.into_iter().map(Goal::try_from).collect()
    }

    fn get_goals_by_family_id(&self, family_id: &str) -> Result<Vec<Goal>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = goals::table
            .filter(goals::family_id.eq(family_id))
            .load::<GoalDB>(&mut conn)
            .into_core()?;
        rows.into_iter().map(Goal::try_from).collect()
    }

    fn get_milestones(&self, goal_id: &str) -> Result<Vec<Milestone>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = milestones::table
            .filter(milestones::goal_id.eq(goal_id))
            .order(milestones::sort_order.asc())
            .load::<MilestoneDB>(&mut conn)
            .into_core()?;
        Ok(rows.into_iter().map(Milestone::from).collect())
    }

    async fn insert_new_goal(&self, new_goal: NewGoal) -> Result<Goal> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Goal> {
                let now = format_timestamp(Utc::now());
                let goal_id = new_goal
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());

                let goal_db = GoalDB {
                    id: goal_id.clone(),
                    family_id: new_goal.family_id,
                    title: new_goal.title,
                    description: new_goal.description,
                    currency: new_goal.currency,
                    target_value: new_goal.target_value,
                    current_value: 0,
                    status: new_goal.status.as_db_str().to_string(),
                    created_at: now.clone(),
                    updated_at: now,
                };
                diesel::insert_into(goals::table)
                    .values(&goal_db)
                    .execute(conn)
                    .map_err(StorageError::from)?;

                let milestone_rows: Vec<MilestoneDB> = new_goal
                    .milestones
                    .into_iter()
                    .enumerate()
                    .map(|(position, m)| MilestoneDB {
                        id: Uuid::new_v4().to_string(),
                        goal_id: goal_id.clone(),
                        title: m.title,
                        target_value: m.target_value,
                        sort_order: position as i32,
                        achieved_at: None,
                    })
                    .collect();
                if !milestone_rows.is_empty() {
                    diesel::insert_into(milestones::table)
                        .values(&milestone_rows)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }

                Self::load_goal(conn, &goal_id)
            })
            .await
    }

    async fn update_goal_status(&self, goal_id: &str, status: GoalStatus) -> Result<Goal> {
        let goal_id = goal_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Goal> {
                diesel::update(goals::table.find(&goal_id))
                    .set((
                        goals::status.eq(status.as_db_str()),
                        goals::updated_at.eq(format_timestamp(Utc::now())),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Self::load_goal(conn, &goal_id)
            })
            .await
    }

    async fn mark_milestone_achieved(
        &self,
        milestone_id: &str,
        achieved_at: DateTime<Utc>,
    ) -> Result<Option<Milestone>> {
        let milestone_id = milestone_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Option<Milestone>> {
                // The is_null filter makes the transition first-writer-wins:
                // a milestone is achieved exactly once, and achieved_at is
                // never overwritten.
                let updated = diesel::update(
                    milestones::table
                        .find(&milestone_id)
                        .filter(milestones::achieved_at.is_null()),
                )
                .set(milestones::achieved_at.eq(format_timestamp(achieved_at)))
                .execute(conn)
                .map_err(StorageError::from)?;

                if updated == 0 {
                    let existing = milestones::table
                        .find(&milestone_id)
                        .first::<MilestoneDB>(conn)
                        .optional()
                        .map_err(StorageError::from)?;
                    return match existing {
                        Some(_) => Ok(None),
                        None => Err(DatabaseError::NotFound(format!(
                            "Milestone {milestone_id}"
                        ))
                        .into()),
                    };
                }

                let row = milestones::table
                    .find(&milestone_id)
                    .first::<MilestoneDB>(conn)
                    .map_err(StorageError::from)?;
                Ok(Some(Milestone::from(row)))
            })
            .await
    }

    async fn complete_goal(&self, goal_id: &str, completed_at: DateTime<Utc>) -> Result<bool> {
        let goal_id = goal_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<bool> {
                let updated = diesel::update(
                    goals::table
                        .find(&goal_id)
                        .filter(goals::status.ne(GoalStatus::Completed.as_db_str())),
                )
                .set((
                    goals::status.eq(GoalStatus::Completed.as_db_str()),
                    goals::updated_at.eq(format_timestamp(completed_at)),
                ))
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(updated > 0)
            })
            .await
    }

    async fn update_cached_value(&self, goal_id: &str, current_value: i64) -> Result<()> {
        let goal_id = goal_id.to_string();
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::update(goals::table.find(&goal_id))
                    .set((
                        goals::current_value.eq(current_value),
                        goals::updated_at.eq(format_timestamp(Utc::now())),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }
}
