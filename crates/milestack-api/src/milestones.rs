use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;

use milestack_store::gen_id;
use milestack_types::api::{Claims, CreateMilestoneRequest, MilestonePatch, ProjectQuery};
use milestack_types::models::Milestone;

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn list_milestones(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<Vec<Milestone>>, ApiError> {
    let project_id = query
        .project_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("projectId required".into()))?;

    if !state.store.is_member(&project_id, &claims.user_id) {
        return Err(ApiError::Forbidden("Not authorized".into()));
    }

    Ok(Json(state.store.milestones_by_project(&project_id)))
}

pub async fn create_milestone(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateMilestoneRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = req.title.ok_or_else(|| ApiError::missing("title"))?;
    let project_id = req.project_id.ok_or_else(|| ApiError::missing("projectId"))?;

    let now = Utc::now();
    let milestone = state.store.insert_milestone(Milestone {
        id: gen_id("mile"),
        title,
        description: req.description.unwrap_or_default(),
        due_date: req.due_date,
        progress: req.progress.unwrap_or(0.0),
        status: req.status.unwrap_or_else(|| "pending".to_string()),
        project_id,
        created_at: now,
        updated_at: now,
    });

    state.store.log_activity(
        &milestone.project_id,
        &claims.user_id,
        &format!("created milestone: {}", milestone.title),
    );

    Ok((StatusCode::CREATED, Json(milestone)))
}

pub async fn update_milestone(
    State(state): State<AppState>,
    Path(milestone_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(patch): Json<MilestonePatch>,
) -> Result<Json<Milestone>, ApiError> {
    let milestone = state
        .store
        .update_milestone(&milestone_id, &patch)
        .ok_or_else(|| ApiError::NotFound("milestone not found".into()))?;

    state.store.log_activity(
        &milestone.project_id,
        &claims.user_id,
        &format!("updated milestone: {}", milestone.title),
    );

    Ok(Json(milestone))
}

pub async fn delete_milestone(
    State(state): State<AppState>,
    Path(milestone_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let milestone = state
        .store
        .delete_milestone(&milestone_id)
        .ok_or_else(|| ApiError::NotFound("milestone not found".into()))?;

    state.store.log_activity(
        &milestone.project_id,
        &claims.user_id,
        &format!("deleted milestone: {}", milestone.title),
    );

    Ok(Json(json!({ "ok": true })))
}
