use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub post: i64,
    pub post_title: String,
    pub author: i64,
    pub author_username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post: i64,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct CommentChanges {
    pub post: Option<i64>,
    pub content: Option<String>,
}
