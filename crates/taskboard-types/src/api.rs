use serde::{Deserialize, Serialize};

// -- Users --

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Full replacement of the current user's fields; there is no partial merge.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

// -- Projects --

/// Clients may send extra fields such as `creation_date`; they are ignored,
/// timestamps are always set by the server.
#[derive(Debug, Deserialize)]
pub struct ProjectRequest {
    #[serde(default)]
    pub title: Option<String>,
}

// -- Tasks --

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub completed: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub completed: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct TaskCompletedRequest {
    pub completed: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskCompletedResponse {
    pub status: String,
    pub completed: i64,
}

// -- Messages --

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub receiver_id: Option<i64>,
    #[serde(default)]
    pub content: Option<String>,
}

// -- Generic bodies --

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn new(status: impl Into<String>) -> Self {
        Self { status: status.into() }
    }
}

/// Body returned by every create operation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub status: String,
    pub id: i64,
}

impl CreatedResponse {
    pub fn new(status: impl Into<String>, id: i64) -> Self {
        Self {
            status: status.into(),
            id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
