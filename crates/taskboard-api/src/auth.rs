use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse};
use tracing::{error, info};

use taskboard_db::Database;
use taskboard_types::api::{CreatedResponse, RegisterRequest, StatusResponse, UpdateUserRequest};
use taskboard_types::models::User;

use crate::credentials::CredentialVerifier;
use crate::error::ApiError;
use crate::middleware::CurrentUser;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub credentials: Box<dyn CredentialVerifier>,
}

/// Runs blocking storage work off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&AppStateInner) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
        .map_err(ApiError::Internal)
}

/// POST /api/user/register/ — open to anonymous callers.
/// Usernames are not checked for uniqueness.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let username = req.username.clone();
    let user_id = run_blocking(&state, move |s| {
        let password = s.credentials.hash(&req.password)?;
        s.db.create_user(&req.name, &req.email, &req.username, &password)
    })
    .await?;

    info!(user_id, username = %username, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse::new("User registered successfully", user_id)),
    ))
}

pub async fn current_user(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(User::from(user))
}

/// PUT /api/user/ — overwrites every field of the caller's row.
pub async fn update_current_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let user_id = user.id;
    run_blocking(&state, move |s| {
        let password = s.credentials.hash(&req.password)?;
        s.db.update_user(user_id, &req.name, &req.email, &req.username, &password)
    })
    .await?;

    info!(user_id, "User updated");

    Ok(Json(StatusResponse::new("User updated successfully")))
}
