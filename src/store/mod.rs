//! Persistence boundary.
//!
//! Handlers never talk to a database directly; they receive an `Arc<dyn Store>`
//! through axum state. Predicates are typed structs: every clause that is `None`
//! is simply omitted, and all present clauses are AND-ed together.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    blog::{Blog, BlogChanges, NewBlog},
    comment::{Comment, NewComment},
    user::{NewUser, User, UserChanges},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Shared handle injected into every handler.
pub type DynStore = Arc<dyn Store>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index (username, email) rejected the write.
    #[error("unique constraint violated")]
    Conflict,

    #[error("{0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => StoreError::Conflict,
            _ => StoreError::Database(err.to_string()),
        }
    }
}

/// One side of a `createdAt` range.
///
/// An unparseable date is kept as `Invalid` rather than rejected: a range with
/// an invalid bound matches no document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    At(DateTime<Utc>),
    Invalid,
}

/// Inclusive bounds on `createdAt`. Either side may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateBound>,
    pub end: Option<DateBound>,
}

impl DateRange {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let lower = match self.start {
            None => true,
            Some(DateBound::At(start)) => at >= start,
            Some(DateBound::Invalid) => false,
        };
        let upper = match self.end {
            None => true,
            Some(DateBound::At(end)) => at <= end,
            Some(DateBound::Invalid) => false,
        };
        lower && upper
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub id: Option<Uuid>,
    pub ids: Option<Vec<Uuid>>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,

    /// Case-insensitive substring match on firstName OR lastName OR username.
    pub name_contains: Option<String>,
}

impl UserFilter {
    pub fn by_name(name: &str) -> Self {
        Self {
            name_contains: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn by_ids(ids: Vec<Uuid>) -> Self {
        Self {
            ids: Some(ids),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlogFilter {
    pub id: Option<Uuid>,
    /// "identity is one of"
    pub id_in: Option<Vec<Uuid>>,
    pub author: Option<Uuid>,
    /// "author is one of"
    pub author_in: Option<Vec<Uuid>>,
    pub content: Option<String>,

    /// Case-insensitive substring match on the title.
    pub title_contains: Option<String>,

    pub created_at: DateRange,
}

impl BlogFilter {
    pub fn by_author(author: Uuid) -> Self {
        Self {
            author: Some(author),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentFilter {
    pub blog: Option<Uuid>,
    pub blog_in: Option<Vec<Uuid>>,
    pub user: Option<Uuid>,
    pub user_in: Option<Vec<Uuid>>,
}

impl CommentFilter {
    pub fn by_blog(blog: Uuid) -> Self {
        Self {
            blog: Some(blog),
            ..Self::default()
        }
    }

    pub fn by_user(user: Uuid) -> Self {
        Self {
            user: Some(user),
            ..Self::default()
        }
    }
}

/// The document-store operations the application relies on.
///
/// Every call is one independent round-trip; no call spans a transaction with
/// another. Results come back in store iteration order (insertion order).
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_users(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn update_user(&self, id: Uuid, changes: UserChanges)
    -> Result<Option<User>, StoreError>;
    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_blogs(&self, filter: &BlogFilter) -> Result<Vec<Blog>, StoreError>;
    async fn find_blog(&self, id: Uuid) -> Result<Option<Blog>, StoreError>;
    async fn insert_blog(&self, blog: NewBlog) -> Result<Blog, StoreError>;
    async fn update_blog(&self, id: Uuid, changes: BlogChanges)
    -> Result<Option<Blog>, StoreError>;
    async fn delete_blog(&self, id: Uuid) -> Result<Option<Blog>, StoreError>;
    async fn delete_blogs(&self, filter: &BlogFilter) -> Result<u64, StoreError>;

    async fn find_comments(&self, filter: &CommentFilter) -> Result<Vec<Comment>, StoreError>;
    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError>;
    async fn delete_comments(&self, filter: &CommentFilter) -> Result<u64, StoreError>;

    /// Distinct `blog` values among the comments matching `filter`.
    async fn distinct_comment_blogs(&self, filter: &CommentFilter)
    -> Result<Vec<Uuid>, StoreError>;
}
