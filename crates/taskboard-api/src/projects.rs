use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};

use taskboard_db::models::ProjectRow;
use taskboard_types::api::{CreatedResponse, ProjectRequest, StatusResponse};
use taskboard_types::models::Project;

use crate::auth::{AppState, run_blocking};
use crate::error::{ApiError, required};
use crate::middleware::CurrentUser;
use crate::now_iso8601;

/// The project `project_id`, provided it belongs to `owner_id`.
/// Every project and task operation goes through here first.
pub(crate) async fn owned_project(
    state: &AppState,
    owner_id: i64,
    project_id: i64,
) -> Result<ProjectRow, ApiError> {
    run_blocking(state, move |s| s.db.get_project(owner_id, project_id))
        .await?
        .ok_or(ApiError::NotFound("Project"))
}

pub async fn list_projects(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let owner_id = user.id;
    let rows = run_blocking(&state, move |s| s.db.list_projects(owner_id)).await?;

    let projects: Vec<Project> = rows.into_iter().map(Project::from).collect();
    Ok(Json(projects))
}

pub async fn create_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<ProjectRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let title = required(req.title, "title")?;

    let owner_id = user.id;
    let now = now_iso8601();
    let project_id =
        run_blocking(&state, move |s| s.db.insert_project(owner_id, &title, &now)).await?;

    info!(project_id, owner_id, "Project created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse::new("Project created successfully", project_id)),
    ))
}

pub async fn get_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(project_id) = path?;
    let project = owned_project(&state, user.id, project_id).await?;
    Ok(Json(Project::from(project)))
}

/// PUT /api/projects/{id}/ — new title, fresh `last_updated`.
pub async fn update_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ProjectRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(project_id) = path?;
    let owner_id = user.id;
    owned_project(&state, owner_id, project_id).await?;

    let Json(req) = payload?;
    let title = required(req.title, "title")?;

    let now = now_iso8601();
    let updated = run_blocking(&state, move |s| {
        s.db.update_project(owner_id, project_id, &title, &now)
    })
    .await?;
    if !updated {
        return Err(ApiError::NotFound("Project"));
    }

    Ok(Json(StatusResponse::new("Project updated successfully")))
}

/// DELETE /api/projects/{id}/ — removes the project together with its tasks.
pub async fn delete_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(project_id) = path?;
    let owner_id = user.id;
    owned_project(&state, owner_id, project_id).await?;

    let deletion = run_blocking(&state, move |s| s.db.delete_project(owner_id, project_id)).await?;
    if !deletion.project_deleted {
        // Deleted by a concurrent request after the ownership check.
        warn!(project_id, "Project vanished before delete");
        return Err(ApiError::NotFound("Project"));
    }

    info!(
        project_id,
        tasks_deleted = deletion.tasks_deleted,
        "Project deleted"
    );

    Ok(Json(StatusResponse::new(
        "Project and associated tasks deleted successfully",
    )))
}
