use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;

use milestack_store::gen_id;
use milestack_types::api::{Claims, CreateTaskRequest, ProjectQuery, TaskPatch};
use milestack_types::models::Task;

use crate::auth::AppState;
use crate::error::ApiError;

/// Listing requires membership in the project; mutations below do not
/// re-check it — any authenticated caller may touch a task by id.
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let project_id = query
        .project_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("projectId required".into()))?;

    if !state.store.is_member(&project_id, &claims.user_id) {
        return Err(ApiError::Forbidden("Not authorized".into()));
    }

    Ok(Json(state.store.tasks_by_project(&project_id)))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = req.title.ok_or_else(|| ApiError::missing("title"))?;
    let priority = req.priority.ok_or_else(|| ApiError::missing("priority"))?;
    let status = req.status.ok_or_else(|| ApiError::missing("status"))?;
    let project_id = req.project_id.ok_or_else(|| ApiError::missing("projectId"))?;

    let now = Utc::now();
    let task = state.store.insert_task(Task {
        id: gen_id("task"),
        title,
        description: req.description.unwrap_or_default(),
        priority,
        status,
        assignee_id: req.assignee_id,
        project_id,
        created_at: now,
        updated_at: now,
    });

    state.store.log_activity(
        &task.project_id,
        &claims.user_id,
        &format!("created task: {}", task.title),
    );

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Task>, ApiError> {
    let task = state
        .store
        .update_task(&task_id, &patch)
        .ok_or_else(|| ApiError::NotFound("task not found".into()))?;

    state.store.log_activity(
        &task.project_id,
        &claims.user_id,
        &format!("updated task: {}", task.title),
    );

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let task = state
        .store
        .delete_task(&task_id)
        .ok_or_else(|| ApiError::NotFound("task not found".into()))?;

    state.store.log_activity(
        &task.project_id,
        &claims.user_id,
        &format!("deleted task: {}", task.title),
    );

    Ok(Json(json!({ "ok": true })))
}
