use serde::{Deserialize, Serialize};

/// The authenticated user as returned by `GET /api/user/`.
/// The stored password is never part of the API model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub creation_date: String,
    pub last_updated: String,
}

/// `completed` is an integer flag (0 or 1), kept as stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub creation_date: String,
    pub completed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub content: String,
    pub timestamp: String,
}
