use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{comment::CommentResponse, user::AuthorSummary, user::trim_in_place};

/// Represents the 'blogs' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: Uuid,
    pub title: String,

    /// Foreign key to `users.id`.
    #[sqlx(rename = "author_id")]
    pub author: Uuid,

    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A blog with its author populated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogResponse {
    pub id: Uuid,
    pub title: String,

    /// `null` when the author reference no longer resolves.
    pub author: Option<AuthorSummary>,

    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogResponse {
    pub fn new(blog: Blog, author: Option<AuthorSummary>) -> Self {
        Self {
            id: blog.id,
            title: blog.title,
            author,
            content: blog.content,
            created_at: blog.created_at,
            updated_at: blog.updated_at,
        }
    }
}

/// A blog with its author and its comments populated. Returned by `GET /blogs/{id}`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogDetail {
    pub id: Uuid,
    pub title: String,
    pub author: Option<AuthorSummary>,
    pub content: String,
    pub comments: Vec<CommentResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogDetail {
    pub fn new(blog: BlogResponse, comments: Vec<CommentResponse>) -> Self {
        Self {
            id: blog.id,
            title: blog.title,
            author: blog.author,
            content: blog.content,
            comments,
            created_at: blog.created_at,
            updated_at: blog.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewBlog {
    pub title: String,
    pub author: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct BlogChanges {
    pub title: Option<String>,
    pub author: Option<Uuid>,
    pub content: Option<String>,
}

impl BlogChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.content.is_none()
    }
}

/// DTO for creating a new blog.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBlogRequest {
    #[validate(length(
        min = 5,
        max = 200,
        message = "Title length must be between 5 and 200 chars"
    ))]
    pub title: Option<String>,

    /// Id of an existing user.
    pub author: Option<String>,

    #[validate(length(min = 10, message = "Content must be at least 10 chars"))]
    pub content: Option<String>,
}

/// DTO for updating a blog. Fields are optional.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBlogRequest {
    #[validate(length(
        min = 5,
        max = 200,
        message = "Title length must be between 5 and 200 chars"
    ))]
    pub title: Option<String>,

    pub author: Option<String>,

    #[validate(length(min = 10, message = "Content must be at least 10 chars"))]
    pub content: Option<String>,
}

impl CreateBlogRequest {
    pub fn normalize(&mut self) {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.author);
        trim_in_place(&mut self.content);
    }
}

impl UpdateBlogRequest {
    pub fn normalize(&mut self) {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.author);
        trim_in_place(&mut self.content);
    }
}

/// Response body for `DELETE /blogs/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedBlog {
    pub message: String,
    pub blog: Blog,
}
