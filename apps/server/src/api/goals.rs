use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use nestfund_core::goals::{Goal, GoalStatus, Milestone, NewGoal};
use nestfund_core::ledger::ProgressLogEntry;
use nestfund_core::progress::{ProgressMutation, ProgressSnapshot, ProgressUpdate};

use crate::{error::ApiResult, main_lib::AppState};

#[derive(serde::Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GoalsQuery {
    family_id: Option<String>,
}

async fn get_goals(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GoalsQuery>,
) -> ApiResult<Json<Vec<Goal>>> {
    let goals = match query.family_id {
        Some(family_id) => state.goal_service.get_goals_by_family_id(&family_id)?,
        None => state.goal_service.get_goals()?,
    };
    Ok(Json(goals))
}

async fn get_goal(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Goal>> {
    let goal = state.goal_service.get_goal(&id)?;
    Ok(Json(goal))
}

async fn create_goal(
    State(state): State<Arc<AppState>>,
    Json(goal): Json<NewGoal>,
) -> ApiResult<(StatusCode, Json<Goal>)> {
    let g = state.goal_service.create_goal(goal).await?;
    Ok((StatusCode::CREATED, Json(g)))
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetStatusRequest {
    status: GoalStatus,
}

async fn set_goal_status(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetStatusRequest>,
) -> ApiResult<Json<Goal>> {
    let goal = state.goal_service.set_status(&id, body.status).await?;
    Ok(Json(goal))
}

async fn get_milestones(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Milestone>>> {
    let milestones = state.goal_service.get_milestones(&id)?;
    Ok(Json(milestones))
}

async fn get_progress(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ProgressSnapshot>> {
    let snapshot = state.progress_service.get_progress(&id)?;
    Ok(Json(snapshot))
}

async fn apply_progress(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(mutation): Json<ProgressMutation>,
) -> ApiResult<Json<ProgressUpdate>> {
    let update = state.progress_service.apply_ledger_event(&id, mutation).await?;
    Ok(Json(update))
}

async fn get_ledger(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<ProgressLogEntry>>> {
    let entries = state.progress_service.get_ledger(&id)?;
    Ok(Json(entries))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/goals", get(get_goals).post(create_goal))
        .route("/goals/{id}", get(get_goal))
        .route("/goals/{id}/status", axum::routing::put(set_goal_status))
        .route("/goals/{id}/milestones", get(get_milestones))
        .route("/goals/{id}/progress", get(get_progress).post(apply_progress))
        .route("/goals/{id}/ledger", get(get_ledger))
}
