//! Database models for goals and milestones.

use diesel::prelude::*;

use nestfund_core::goals::{Goal, GoalStatus, Milestone};
use nestfund_core::Error;

use crate::utils::parse_timestamp_tolerant;

/// Database model for goals.
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::goals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GoalDB {
    pub id: String,
    pub family_id: String,
    pub title: String,
    pub description: Option<String>,
    pub currency: String,
    pub target_value: i64,
    pub current_value: i64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Database model for milestones.
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::milestones)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MilestoneDB {
    pub id: String,
    pub goal_id: String,
    pub title: Option<String>,
    pub target_value: i64,
    pub sort_order: i32,
    pub achieved_at: Option<String>,
}

// Conversion to domain models. Status strings are validated on the way out,
// so a corrupt row surfaces as an error instead of a silently wrong status.

impl TryFrom<GoalDB> for Goal {
    type Error = Error;

    fn try_from(db: GoalDB) -> Result<Self, Error> {
        Ok(Self {
            status: GoalStatus::parse(&db.status)?,
            id: db.id,
            family_id: db.family_id,
            title: db.title,
            description: db.description,
            currency: db.currency,
            target_value: db.target_value,
            current_value: db.current_value,
            created_at: parse_timestamp_tolerant(&db.created_at, "goals.created_at"),
            updated_at: parse_timestamp_tolerant(&db.updated_at, "goals.updated_at"),
        })
    }
}

impl From<MilestoneDB> for Milestone {
    fn from(db: MilestoneDB) -> Self {
        Self {
            id: db.id,
            goal_id: db.goal_id,
            title: db.title,
            target_value: db.target_value,
            order: db.sort_order,
            achieved_at: db
                .achieved_at
                .map(|ts| parse_timestamp_tolerant(&ts, "milestones.achieved_at")),
        }
    }
}
