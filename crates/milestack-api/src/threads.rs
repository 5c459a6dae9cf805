use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;

use milestack_store::gen_id;
use milestack_types::api::{Claims, CreateThreadRequest, ProjectQuery, ThreadUpdateRequest};
use milestack_types::models::{ChatMessage, ChatThread};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn list_threads(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<ProjectQuery>,
) -> Result<Json<Vec<ChatThread>>, ApiError> {
    let project_id = query
        .project_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Validation("projectId required".into()))?;

    if !state.store.is_member(&project_id, &claims.user_id) {
        return Err(ApiError::Forbidden("Not authorized".into()));
    }

    Ok(Json(state.store.threads_by_project(&project_id)))
}

pub async fn create_thread(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateThreadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(title), Some(project_id)) = (
        req.title.filter(|s| !s.is_empty()),
        req.project_id.filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::Validation("title and projectId required".into()));
    };

    let now = Utc::now();
    let thread = state.store.insert_thread(ChatThread {
        id: gen_id("thread"),
        title,
        project_id,
        creator_id: claims.user_id.clone(),
        messages: Vec::new(),
        created_at: now,
        updated_at: now,
    });

    state.store.log_activity(
        &thread.project_id,
        &claims.user_id,
        &format!("created chat thread: {}", thread.title),
    );

    Ok((StatusCode::CREATED, Json(thread)))
}

/// Dual-mode update. A body carrying `message` appends to the thread and
/// lands in the activity feed; a plain title/messages patch does not.
pub async fn update_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ThreadUpdateRequest>,
) -> Result<Json<ChatThread>, ApiError> {
    let thread = state
        .store
        .thread_by_id(&thread_id)
        .ok_or_else(|| ApiError::NotFound("thread not found".into()))?;

    if let Some(payload) = req.message {
        let text = payload.text.as_deref().unwrap_or("").trim().to_string();
        if text.is_empty() {
            return Err(ApiError::Validation("message.text required".into()));
        }

        let message = ChatMessage {
            id: gen_id("msg"),
            text,
            sender_id: payload.sender_id.unwrap_or_else(|| claims.user_id.clone()),
            timestamp: Utc::now(),
        };

        let updated = state
            .store
            .append_message(&thread.id, message)
            .ok_or_else(|| ApiError::NotFound("thread not found".into()))?;

        state.store.log_activity(
            &thread.project_id,
            &claims.user_id,
            &format!("sent a message in thread: {}", thread.title),
        );

        return Ok(Json(updated));
    }

    if req.title.is_none() && req.messages.is_none() {
        return Ok(Json(thread));
    }

    let updated = state
        .store
        .patch_thread(&thread.id, req.title.as_deref(), req.messages)
        .ok_or_else(|| ApiError::NotFound("thread not found".into()))?;

    Ok(Json(updated))
}

pub async fn delete_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let thread = state
        .store
        .delete_thread(&thread_id)
        .ok_or_else(|| ApiError::NotFound("thread not found".into()))?;

    state.store.log_activity(
        &thread.project_id,
        &claims.user_id,
        &format!("deleted chat thread: {}", thread.title),
    );

    Ok(Json(json!({ "ok": true })))
}
