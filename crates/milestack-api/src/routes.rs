use axum::{
    Json, Router,
    routing::{get, post, put},
};
use serde_json::json;

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{milestones, projects, tasks, team, threads};

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true, "msg": "Milestack backend running" }))
}

/// The full HTTP surface. Auth endpoints and the health check are public;
/// everything else sits behind the bearer-token middleware.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/", get(health))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected = Router::new()
        .route(
            "/api/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route("/api/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/api/tasks/{task_id}",
            put(tasks::update_task).delete(tasks::delete_task),
        )
        .route(
            "/api/milestones",
            get(milestones::list_milestones).post(milestones::create_milestone),
        )
        .route(
            "/api/milestones/{milestone_id}",
            put(milestones::update_milestone).delete(milestones::delete_milestone),
        )
        .route(
            "/api/chatThreads",
            get(threads::list_threads).post(threads::create_thread),
        )
        .route(
            "/api/chatThreads/{thread_id}",
            put(threads::update_thread).delete(threads::delete_thread),
        )
        .route("/api/teammates", get(team::list_teammates))
        .route("/api/invites", get(team::list_invites))
        .route("/api/activities", get(team::list_activities))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ))
        .with_state(state);

    Router::new().merge(public).merge(protected)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use milestack_store::Store;

    use crate::auth::{AppStateInner, AuthConfig, decode_token};

    use super::router;

    const TEST_SECRET: &str = "test-secret";

    fn app() -> (Router, Arc<AppStateInner>) {
        let state = Arc::new(AppStateInner {
            store: Store::new(),
            auth: AuthConfig {
                jwt_secret: TEST_SECRET.to_string(),
                token_exp_hours: 24,
            },
        });
        (router(state.clone()), state)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::from("{}"),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn signup(app: &Router, name: &str, email: &str) -> (String, String) {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "name": name, "email": email, "password": "pw-123456" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        (
            body["token"].as_str().unwrap().to_string(),
            body["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    async fn create_project(app: &Router, token: &str, title: &str) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/projects",
            Some(token),
            Some(json!({ "title": title })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::GET, "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));
    }

    #[tokio::test]
    async fn signup_token_decodes_to_created_user() {
        let (app, _) = app();
        let (token, user_id) = signup(&app, "Alice", "alice@x.com").await;

        let claims = decode_token(TEST_SECRET, &token).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.email, "alice@x.com");
        assert!(user_id.starts_with("user-"));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let (app, _) = app();
        signup(&app, "Alice", "alice@x.com").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "name": "Alice 2", "email": "alice@x.com", "password": "pw" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "email already exists");
    }

    #[tokio::test]
    async fn signup_requires_all_fields() {
        let (app, _) = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/signup",
            None,
            Some(json!({ "name": "Alice", "email": "alice@x.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "name, email, password required");
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let (app, _) = app();
        signup(&app, "Alice", "alice@x.com").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@x.com", "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid credentials");
    }

    #[tokio::test]
    async fn login_logs_activity_in_each_project() {
        let (app, _) = app();
        let (token, _) = signup(&app, "Alice", "alice@x.com").await;
        let project_id = create_project(&app, &token, "Apollo").await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@x.com", "password": "pw-123456" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, feed) = send(
            &app,
            Method::GET,
            &format!("/api/activities?projectId={project_id}"),
            Some(&token),
            None,
        )
        .await;
        let logins = feed
            .as_array()
            .unwrap()
            .iter()
            .filter(|a| a["description"] == "logged in")
            .count();
        assert_eq!(logins, 1);
    }

    #[tokio::test]
    async fn missing_bearer_header_is_rejected() {
        let (app, _) = app();
        let (status, body) = send(&app, Method::GET, "/api/projects", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authorization header missing or malformed");
    }

    #[tokio::test]
    async fn garbage_token_is_invalid() {
        let (app, _) = app();
        let (status, body) =
            send(&app, Method::GET, "/api/projects", Some("not.a.jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_token");
    }

    #[tokio::test]
    async fn project_creator_becomes_permanent_leader() {
        let (app, state) = app();
        let (token, user_id) = signup(&app, "Alice", "alice@x.com").await;
        let project_id = create_project(&app, &token, "Apollo").await;

        assert!(state.store.is_leader(&project_id, &user_id));

        // a later add with a weaker role must not demote
        state.store.add_member(&project_id, &user_id, "member");
        assert!(state.store.is_leader(&project_id, &user_id));

        let (_, projects) = send(&app, Method::GET, "/api/projects", Some(&token), None).await;
        assert_eq!(projects.as_array().unwrap().len(), 1);
        assert_eq!(projects[0]["id"], json!(project_id.clone()));

        // non-members see nothing
        let (stranger, _) = signup(&app, "Eve", "eve@x.com").await;
        let (_, other) = send(&app, Method::GET, "/api/projects", Some(&stranger), None).await;
        assert!(other.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn project_requires_title() {
        let (app, _) = app();
        let (token, _) = signup(&app, "Alice", "alice@x.com").await;
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/projects",
            Some(&token),
            Some(json!({ "description": "no title" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "title required");
    }

    #[tokio::test]
    async fn task_lifecycle_with_activities() {
        let (app, _) = app();
        let (token, _) = signup(&app, "Alice", "alice@x.com").await;
        let project_id = create_project(&app, &token, "Apollo").await;

        let (status, task) = send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(&token),
            Some(json!({
                "title": "ship v2",
                "priority": "high",
                "status": "open",
                "projectId": project_id,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let task_id = task["id"].as_str().unwrap().to_string();
        assert!(task_id.starts_with("task-"));

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/tasks/{task_id}"),
            Some(&token),
            Some(json!({ "status": "done", "ignored": "field" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "done");
        assert_eq!(updated["title"], "ship v2");

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/tasks/{task_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));

        let (_, tasks) = send(
            &app,
            Method::GET,
            &format!("/api/tasks?projectId={project_id}"),
            Some(&token),
            None,
        )
        .await;
        assert!(tasks.as_array().unwrap().is_empty());

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/tasks/{task_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "task not found");

        let (_, feed) = send(
            &app,
            Method::GET,
            &format!("/api/activities?projectId={project_id}"),
            Some(&token),
            None,
        )
        .await;
        let descriptions: Vec<&str> = feed
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["description"].as_str().unwrap())
            .collect();
        assert!(descriptions.contains(&"deleted task: ship v2"));
        assert!(descriptions.contains(&"updated task: ship v2"));
    }

    #[tokio::test]
    async fn task_create_names_missing_field() {
        let (app, _) = app();
        let (token, _) = signup(&app, "Alice", "alice@x.com").await;
        let project_id = create_project(&app, &token, "Apollo").await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(&token),
            Some(json!({ "title": "no priority", "status": "open", "projectId": project_id })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "priority is required");
    }

    #[tokio::test]
    async fn task_listing_requires_membership() {
        let (app, _) = app();
        let (token, _) = signup(&app, "Alice", "alice@x.com").await;
        let project_id = create_project(&app, &token, "Apollo").await;
        let (stranger, _) = signup(&app, "Eve", "eve@x.com").await;

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/api/tasks?projectId={project_id}"),
            Some(&stranger),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Not authorized");

        let (status, _) = send(&app, Method::GET, "/api/tasks", Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn mutations_skip_membership_check() {
        let (app, _) = app();
        let (token, _) = signup(&app, "Alice", "alice@x.com").await;
        let project_id = create_project(&app, &token, "Apollo").await;

        let (_, task) = send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(&token),
            Some(json!({
                "title": "ship v2",
                "priority": "high",
                "status": "open",
                "projectId": project_id,
            })),
        )
        .await;
        let task_id = task["id"].as_str().unwrap();

        // a non-member who knows the id may still mutate it
        let (stranger, _) = signup(&app, "Eve", "eve@x.com").await;
        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/tasks/{task_id}"),
            Some(&stranger),
            Some(json!({ "status": "hijacked" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["status"], "hijacked");

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/api/tasks/{task_id}"),
            Some(&stranger),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn milestone_defaults_and_listing_auth() {
        let (app, _) = app();
        let (token, _) = signup(&app, "Alice", "alice@x.com").await;
        let project_id = create_project(&app, &token, "Apollo").await;

        let (status, milestone) = send(
            &app,
            Method::POST,
            "/api/milestones",
            Some(&token),
            Some(json!({ "title": "beta", "projectId": project_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(milestone["progress"], json!(0.0));
        assert_eq!(milestone["status"], "pending");
        assert_eq!(milestone["dueDate"], Value::Null);

        let (stranger, _) = signup(&app, "Eve", "eve@x.com").await;
        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/api/milestones?projectId={project_id}"),
            Some(&stranger),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn thread_message_append_and_patch() {
        let (app, _) = app();
        let (token, user_id) = signup(&app, "Alice", "alice@x.com").await;
        let project_id = create_project(&app, &token, "Apollo").await;

        let (status, thread) = send(
            &app,
            Method::POST,
            "/api/chatThreads",
            Some(&token),
            Some(json!({ "title": "standup", "projectId": project_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let thread_id = thread["id"].as_str().unwrap().to_string();

        // whitespace-only text is rejected
        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/chatThreads/{thread_id}"),
            Some(&token),
            Some(json!({ "message": { "text": "   " } })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "message.text required");

        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/chatThreads/{thread_id}"),
            Some(&token),
            Some(json!({ "message": { "text": "hi" } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let messages = updated["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["text"], "hi");
        assert_eq!(messages[0]["senderId"], json!(user_id.clone()));
        assert!(messages[0]["id"].as_str().unwrap().starts_with("msg-"));

        let (_, feed) = send(
            &app,
            Method::GET,
            &format!("/api/activities?projectId={project_id}"),
            Some(&token),
            None,
        )
        .await;
        let feed_len_after_message = feed.as_array().unwrap().len();

        // plain patches rename without touching the feed
        let (status, patched) = send(
            &app,
            Method::PUT,
            &format!("/api/chatThreads/{thread_id}"),
            Some(&token),
            Some(json!({ "title": "retro" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(patched["title"], "retro");

        let (_, feed) = send(
            &app,
            Method::GET,
            &format!("/api/activities?projectId={project_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(feed.as_array().unwrap().len(), feed_len_after_message);
    }

    #[tokio::test]
    async fn thread_delete_and_not_found() {
        let (app, _) = app();
        let (token, _) = signup(&app, "Alice", "alice@x.com").await;
        let project_id = create_project(&app, &token, "Apollo").await;

        let (_, thread) = send(
            &app,
            Method::POST,
            "/api/chatThreads",
            Some(&token),
            Some(json!({ "title": "standup", "projectId": project_id })),
        )
        .await;
        let thread_id = thread["id"].as_str().unwrap();

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("/api/chatThreads/{thread_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], json!(true));

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/api/chatThreads/{thread_id}"),
            Some(&token),
            Some(json!({ "title": "ghost" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "thread not found");
    }

    #[tokio::test]
    async fn invite_is_consumed_at_signup() {
        let (app, state) = app();
        let (leader_token, _) = signup(&app, "Alice", "alice@x.com").await;
        let project_id = create_project(&app, &leader_token, "Apollo").await;

        state.store.create_invite(&project_id, "bob@x.com", "Bob");

        let (_, bob_id) = signup(&app, "Bob", "bob@x.com").await;

        let (_, teammates) = send(
            &app,
            Method::GET,
            &format!("/api/teammates?projectId={project_id}"),
            Some(&leader_token),
            None,
        )
        .await;
        let bob = teammates
            .as_array()
            .unwrap()
            .iter()
            .find(|t| t["id"] == json!(bob_id.clone()))
            .expect("bob should be a teammate");
        assert_eq!(bob["role"], "member");

        let (_, invites) = send(&app, Method::GET, "/api/invites", Some(&leader_token), None).await;
        assert!(invites.as_array().unwrap().is_empty());

        let (_, feed) = send(
            &app,
            Method::GET,
            &format!("/api/activities?projectId={project_id}"),
            Some(&leader_token),
            None,
        )
        .await;
        let joins = feed
            .as_array()
            .unwrap()
            .iter()
            .filter(|a| a["description"] == "joined the project" && a["userId"] == json!(bob_id.clone()))
            .count();
        assert_eq!(joins, 1);
    }

    #[tokio::test]
    async fn invites_filter_by_project_is_pending_only() {
        let (app, state) = app();
        let (token, _) = signup(&app, "Alice", "alice@x.com").await;
        let project_id = create_project(&app, &token, "Apollo").await;

        state.store.create_invite(&project_id, "bob@x.com", "Bob");
        state.store.create_invite("proj-other", "carol@x.com", "Carol");

        let (_, scoped) = send(
            &app,
            Method::GET,
            &format!("/api/invites?projectId={project_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(scoped.as_array().unwrap().len(), 1);
        assert_eq!(scoped[0]["email"], "bob@x.com");

        let (_, all) = send(&app, Method::GET, "/api/invites", Some(&token), None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn activity_feed_is_newest_first() {
        let (app, _) = app();
        let (token, _) = signup(&app, "Alice", "alice@x.com").await;
        let project_id = create_project(&app, &token, "Apollo").await;

        send(
            &app,
            Method::POST,
            "/api/tasks",
            Some(&token),
            Some(json!({
                "title": "later",
                "priority": "low",
                "status": "open",
                "projectId": project_id,
            })),
        )
        .await;

        let (_, feed) = send(
            &app,
            Method::GET,
            &format!("/api/activities?projectId={project_id}"),
            Some(&token),
            None,
        )
        .await;
        let feed = feed.as_array().unwrap();
        assert_eq!(feed[0]["description"], "created task: later");
        assert_eq!(feed[feed.len() - 1]["description"], "created the project");
    }

    #[tokio::test]
    async fn teammates_put_leader_first() {
        let (app, state) = app();
        let (leader_token, leader_id) = signup(&app, "Alice", "alice@x.com").await;
        let project_id = create_project(&app, &leader_token, "Apollo").await;

        state.store.create_invite(&project_id, "bob@x.com", "Bob");
        signup(&app, "Bob", "bob@x.com").await;

        let (_, teammates) = send(
            &app,
            Method::GET,
            &format!("/api/teammates?projectId={project_id}"),
            Some(&leader_token),
            None,
        )
        .await;
        let teammates = teammates.as_array().unwrap();
        assert_eq!(teammates.len(), 2);
        assert_eq!(teammates[0]["id"], json!(leader_id));
        assert_eq!(teammates[0]["role"], "leader");
        assert_eq!(teammates[1]["role"], "member");
    }
}
