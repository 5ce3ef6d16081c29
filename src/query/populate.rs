//! Replaces foreign keys with partial user documents.
//!
//! Each call resolves all referenced users with a single batched lookup.

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    models::{
        blog::{Blog, BlogResponse},
        comment::{Comment, CommentResponse},
        user::{AuthorSummary, CommenterSummary, User},
    },
    store::{Store, StoreError, UserFilter},
};

async fn users_by_id(
    store: &dyn Store,
    ids: impl Iterator<Item = Uuid>,
) -> Result<HashMap<Uuid, User>, StoreError> {
    let mut ids: Vec<Uuid> = ids.collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = store.find_users(&UserFilter::by_ids(ids)).await?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}

pub async fn populate_blogs(
    store: &dyn Store,
    blogs: Vec<Blog>,
) -> Result<Vec<BlogResponse>, StoreError> {
    let authors = users_by_id(store, blogs.iter().map(|b| b.author)).await?;

    Ok(blogs
        .into_iter()
        .map(|blog| {
            let author = authors.get(&blog.author).map(AuthorSummary::from);
            BlogResponse::new(blog, author)
        })
        .collect())
}

pub async fn populate_blog(store: &dyn Store, blog: Blog) -> Result<BlogResponse, StoreError> {
    let author = store.find_user(blog.author).await?;
    Ok(BlogResponse::new(blog, author.as_ref().map(AuthorSummary::from)))
}

pub async fn populate_comments(
    store: &dyn Store,
    comments: Vec<Comment>,
) -> Result<Vec<CommentResponse>, StoreError> {
    let users = users_by_id(store, comments.iter().map(|c| c.user)).await?;

    Ok(comments
        .into_iter()
        .map(|comment| {
            let user = users.get(&comment.user).map(CommenterSummary::from);
            CommentResponse::new(comment, user)
        })
        .collect())
}
