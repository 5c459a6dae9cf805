use axum::{
    Extension, Json,
    extract::{Query, State},
};

use milestack_types::api::{Claims, ProjectQuery, Teammate};
use milestack_types::models::{Activity, Invite};

use crate::auth::AppState;
use crate::error::ApiError;

/// Membership rows joined with users, leader first. The caller is not
/// required to be a member themselves.
pub async fn list_teammates(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<Vec<Teammate>>, ApiError> {
    let project_id = query
        .project_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("projectId required".into()))?;

    Ok(Json(state.store.teammates(&project_id)))
}

/// With projectId: that project's pending invites. Without: every invite.
pub async fn list_invites(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Query(query): Query<ProjectQuery>,
) -> Json<Vec<Invite>> {
    match query.project_id.filter(|s| !s.is_empty()) {
        Some(project_id) => Json(state.store.pending_invites_for_project(&project_id)),
        None => Json(state.store.all_invites()),
    }
}

pub async fn list_activities(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<Vec<Activity>>, ApiError> {
    let project_id = query
        .project_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("projectId required".into()))?;

    if !state.store.is_member(&project_id, &claims.user_id) {
        return Err(ApiError::Forbidden("Not authorized".into()));
    }

    Ok(Json(state.store.project_activities(&project_id)))
}
