use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::user::CommenterSummary;

/// Represents the 'comments' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,

    #[sqlx(rename = "blog_id")]
    pub blog: Uuid,

    #[sqlx(rename = "user_id")]
    pub user: Uuid,

    pub content: String,

    /// Optional rating, 1 to 5.
    pub note: Option<i32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for displaying a comment with its author populated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub blog: Uuid,
    pub user: Option<CommenterSummary>,
    pub content: String,
    pub note: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentResponse {
    pub fn new(comment: Comment, user: Option<CommenterSummary>) -> Self {
        Self {
            id: comment.id,
            blog: comment.blog,
            user,
            content: comment.content,
            note: comment.note,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub blog: Uuid,
    pub user: Uuid,
    pub content: String,
    pub note: Option<i32>,
}

/// DTO for adding a comment to a blog.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    /// Id of the commenting user.
    pub user: Option<String>,

    #[validate(length(
        min = 1,
        max = 500,
        message = "Comment must be between 1 and 500 characters"
    ))]
    pub content: Option<String>,

    #[validate(range(min = 1, max = 5, message = "Note must be between 1 and 5"))]
    pub note: Option<i32>,
}
