use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use taskboard_db::models::TaskRow;
use taskboard_types::api::{
    CreateTaskRequest, CreatedResponse, StatusResponse, TaskCompletedRequest,
    TaskCompletedResponse, UpdateTaskRequest,
};
use taskboard_types::models::Task;

use crate::auth::{AppState, run_blocking};
use crate::error::{ApiError, completed_flag, required};
use crate::middleware::CurrentUser;
use crate::now_iso8601;
use crate::projects::owned_project;

/// Project ownership first, then the task under that project. The task is
/// never probed when the project check fails.
async fn owned_task(
    state: &AppState,
    owner_id: i64,
    project_id: i64,
    task_id: i64,
) -> Result<TaskRow, ApiError> {
    owned_project(state, owner_id, project_id).await?;

    run_blocking(state, move |s| s.db.get_task(project_id, task_id))
        .await?
        .ok_or(ApiError::NotFound("Task"))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(project_id) = path?;
    owned_project(&state, user.id, project_id).await?;

    let rows = run_blocking(&state, move |s| s.db.list_tasks(project_id)).await?;
    let tasks: Vec<Task> = rows.into_iter().map(Task::from).collect();
    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(project_id) = path?;
    owned_project(&state, user.id, project_id).await?;

    let Json(req) = payload?;
    let title = required(req.title, "title")?;
    let completed = completed_flag(req.completed.unwrap_or(0))?;

    let now = now_iso8601();
    let task_id = run_blocking(&state, move |s| {
        s.db.insert_task(project_id, &title, &now, completed)
    })
    .await?;

    info!(task_id, project_id, "Task created");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse::new("Task created successfully", task_id)),
    ))
}

pub async fn get_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path((project_id, task_id)) = path?;
    let task = owned_task(&state, user.id, project_id, task_id).await?;
    Ok(Json(Task::from(task)))
}

/// PUT replaces the title and the completed flag; an omitted flag keeps
/// the stored value.
pub async fn update_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<(i64, i64)>, PathRejection>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path((project_id, task_id)) = path?;
    let current = owned_task(&state, user.id, project_id, task_id).await?;

    let Json(req) = payload?;
    let title = required(req.title, "title")?;
    let completed = completed_flag(req.completed.unwrap_or(current.completed))?;

    let updated = run_blocking(&state, move |s| {
        s.db.update_task(project_id, task_id, &title, completed)
    })
    .await?;
    if !updated {
        return Err(ApiError::NotFound("Task"));
    }

    Ok(Json(StatusResponse::new("Task updated successfully")))
}

pub async fn delete_task(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path((project_id, task_id)) = path?;
    owned_task(&state, user.id, project_id, task_id).await?;

    let deleted = run_blocking(&state, move |s| s.db.delete_task(project_id, task_id)).await?;
    if !deleted {
        return Err(ApiError::NotFound("Task"));
    }

    info!(task_id, project_id, "Task deleted");

    Ok(Json(StatusResponse::new("Task deleted successfully")))
}

/// PATCH /api/tasks/{id}/completed/ — ownership is checked in a single
/// task-project join, and the response carries the value read back after
/// the write.
pub async fn set_task_completed(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<TaskCompletedRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(task_id) = path?;
    let owner_id = user.id;
    run_blocking(&state, move |s| s.db.get_owned_task(owner_id, task_id))
        .await?
        .ok_or(ApiError::NotFound("Task"))?;

    let Json(req) = payload?;
    let completed = completed_flag(req.completed)?;

    let stored = run_blocking(&state, move |s| s.db.set_task_completed(task_id, completed))
        .await?
        .ok_or(ApiError::NotFound("Task"))?;

    Ok(Json(TaskCompletedResponse {
        status: "Task completion status updated successfully".to_string(),
        completed: stored,
    }))
}
