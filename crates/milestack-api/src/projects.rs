use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use milestack_store::gen_id;
use milestack_types::api::{Claims, CreateProjectRequest};
use milestack_types::models::{Project, ROLE_LEADER};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn create_project(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateProjectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = req
        .title
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("title required".into()))?;

    let project = state.store.insert_project(Project {
        id: gen_id("proj"),
        title,
        description: req.description.unwrap_or_default(),
        status: "running".to_string(),
        members: vec![claims.user_id.clone()],
    });

    state.store.add_member(&project.id, &claims.user_id, ROLE_LEADER);
    state
        .store
        .log_activity(&project.id, &claims.user_id, "created the project");

    Ok((StatusCode::CREATED, Json(project)))
}

/// Only projects the caller has a membership row for.
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Json<Vec<Project>> {
    Json(state.store.projects_for_user(&claims.user_id))
}
