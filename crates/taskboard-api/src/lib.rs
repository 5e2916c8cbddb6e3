pub mod auth;
pub mod credentials;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod projects;
pub mod seed;
pub mod tasks;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::auth::AppState;

/// All `/api` routes, with identity resolution in front of every one of them.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/user/register/", post(auth::register))
        .route(
            "/api/user/",
            get(auth::current_user).put(auth::update_current_user),
        )
        .route(
            "/api/projects/",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/api/projects/{project_id}/",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/api/projects/{project_id}/tasks/",
            get(tasks::list_tasks).post(tasks::create_task),
        )
        .route(
            "/api/projects/{project_id}/tasks/{task_id}/",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route(
            "/api/tasks/{task_id}/completed/",
            patch(tasks::set_task_completed),
        )
        .route(
            "/api/messages/",
            get(messages::list_messages).post(messages::send_message),
        )
        .route(
            "/api/messages/{message_id}/",
            get(messages::get_message).delete(messages::delete_message),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::resolve_identity,
        ))
        .with_state(state)
}

/// Current UTC time as an ISO-8601 string, e.g. `2024-06-28T12:00:00.123456+00:00`.
pub(crate) fn now_iso8601() -> String {
    chrono::Utc::now().to_rfc3339()
}
