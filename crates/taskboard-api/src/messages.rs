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

use taskboard_db::models::MessageRow;
use taskboard_types::api::{CreatedResponse, SendMessageRequest, StatusResponse};
use taskboard_types::models::Message;

use crate::auth::{AppState, run_blocking};
use crate::error::{ApiError, required};
use crate::middleware::CurrentUser;
use crate::now_iso8601;

async fn visible_message(
    state: &AppState,
    user_id: i64,
    message_id: i64,
) -> Result<MessageRow, ApiError> {
    run_blocking(state, move |s| s.db.get_visible_message(user_id, message_id))
        .await?
        .ok_or(ApiError::NotFound("Message"))
}

/// GET /api/messages/ — the caller's inbox. Messages the caller sent are
/// not included.
pub async fn list_messages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let receiver_id = user.id;
    let rows = run_blocking(&state, move |s| s.db.list_inbox(receiver_id)).await?;

    let messages: Vec<Message> = rows.into_iter().map(Message::from).collect();
    Ok(Json(messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let receiver_id = req.receiver_id.ok_or_else(|| {
        warn!("Missing field 'receiver_id'");
        ApiError::InvalidInput
    })?;
    let content = required(req.content, "content")?;

    let sender_id = user.id;
    let now = now_iso8601();
    let message_id = run_blocking(&state, move |s| {
        s.db.insert_message(sender_id, receiver_id, &content, &now)
    })
    .await?
    .ok_or_else(|| {
        warn!(receiver_id, "Message addressed to unknown user");
        ApiError::InvalidInput
    })?;

    info!(message_id, sender_id, receiver_id, "Message sent");

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse::new("Message sent successfully", message_id)),
    ))
}

pub async fn get_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(message_id) = path?;
    let message = visible_message(&state, user.id, message_id).await?;
    Ok(Json(Message::from(message)))
}

/// Either side of the conversation may delete a message.
pub async fn delete_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(message_id) = path?;
    visible_message(&state, user.id, message_id).await?;

    let deleted = run_blocking(&state, move |s| s.db.delete_message(message_id)).await?;
    if !deleted {
        return Err(ApiError::NotFound("Message"));
    }

    info!(message_id, "Message deleted");

    Ok(Json(StatusResponse::new("Message deleted successfully")))
}
