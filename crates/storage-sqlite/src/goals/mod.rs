//! Goal and milestone storage.

mod model;
mod repository;

pub use model::{GoalDB, MilestoneDB};
pub use repository::GoalRepository;
