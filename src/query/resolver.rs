//! Resolves human-readable name filters into sets of identity keys.
//!
//! The store cannot join, so each resolution is a chain of sequential
//! round-trips whose output feeds the next query.

use uuid::Uuid;

use super::params::BlogQuery;
use crate::store::{BlogFilter, CommentFilter, Store, StoreError, UserFilter};

/// Ids of users whose firstName, lastName or username contains `name`
/// (case-insensitive).
pub async fn matching_user_ids(store: &dyn Store, name: &str) -> Result<Vec<Uuid>, StoreError> {
    let users = store.find_users(&UserFilter::by_name(name)).await?;
    Ok(users.into_iter().map(|u| u.id).collect())
}

/// Ids of blogs that carry at least one comment written by a user matching `name`.
pub async fn commented_blog_ids(store: &dyn Store, name: &str) -> Result<Vec<Uuid>, StoreError> {
    let users = matching_user_ids(store, name).await?;
    if users.is_empty() {
        return Ok(Vec::new());
    }

    let filter = CommentFilter {
        user_in: Some(users),
        ..CommentFilter::default()
    };
    store.distinct_comment_blogs(&filter).await
}

/// Builds the final blog predicate, resolving `authorName` and
/// `commenterName` first. An empty resolution yields an empty "one of"
/// clause, i.e. a predicate that matches nothing.
pub async fn compose_blog_filter(
    store: &dyn Store,
    query: &BlogQuery,
) -> Result<BlogFilter, StoreError> {
    let mut filter = query.filter.clone();

    if let Some(name) = &query.author_name {
        let authors = matching_user_ids(store, name).await?;
        tracing::debug!(author_name = %name, matched = authors.len(), "Resolved author filter");
        filter.author_in = Some(authors);
    }

    if let Some(name) = &query.commenter_name {
        let blogs = commented_blog_ids(store, name).await?;
        tracing::debug!(commenter_name = %name, matched = blogs.len(), "Resolved commenter filter");
        filter.id_in = Some(blogs);
    }

    Ok(filter)
}
