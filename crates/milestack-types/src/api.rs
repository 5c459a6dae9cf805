use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{ChatMessage, UserPublic};

// -- JWT Claims --

/// JWT claims shared between token issuance (auth handlers) and the bearer
/// middleware. Canonical definition lives here in milestack-types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub exp: usize,
}

// -- Auth --

/// Required fields stay `Option` so handlers can answer with the exact
/// "missing field" message instead of a serde rejection.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserPublic,
}

// -- Projects --

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

// -- Tasks --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub assignee_id: Option<String>,
    pub project_id: Option<String>,
}

/// Whitelisted patch for PUT /api/tasks/{id}. Unknown keys are dropped by
/// deserialization rather than rejected. `assignee_id` distinguishes "not in
/// the patch" from an explicit null, which clears the assignee.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<String>>,
}

// -- Milestones --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMilestoneRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub progress: Option<f64>,
    pub status: Option<String>,
    pub project_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestonePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,
    pub status: Option<String>,
    pub progress: Option<f64>,
}

// -- Chat threads --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateThreadRequest {
    pub title: Option<String>,
    pub project_id: Option<String>,
}

/// PUT /api/chatThreads/{id} body. A present `message` appends to the thread;
/// otherwise `title`/`messages` act as a plain whitelist patch.
#[derive(Debug, Deserialize)]
pub struct ThreadUpdateRequest {
    pub message: Option<MessagePayload>,
    pub title: Option<String>,
    pub messages: Option<Vec<ChatMessage>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    pub text: Option<String>,
    pub sender_id: Option<String>,
}

// -- Team --

/// Membership row joined with its user, as returned by GET /api/teammates.
#[derive(Debug, Clone, Serialize)]
pub struct Teammate {
    pub id: String,
    pub name: String,
    pub email: String,
    pub status: String,
    pub role: String,
}

// -- Query params --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectQuery {
    pub project_id: Option<String>,
}

/// Deserializes into `Some(inner)` whenever the key is present, so callers
/// can tell an explicit `null` apart from an absent field.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}
