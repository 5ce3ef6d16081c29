//! Application-level referential cleanup.
//!
//! Each step is its own store operation. If a later step fails, earlier ones
//! stay committed and dependents may be left orphaned; the error is still
//! reported to the caller.

use uuid::Uuid;

use crate::{
    models::{blog::Blog, user::User},
    store::{BlogFilter, CommentFilter, Store, StoreError},
};

/// Deletes a blog, then every comment attached to it.
/// Returns `None` (and touches nothing) when the blog does not exist.
pub async fn delete_blog(store: &dyn Store, id: Uuid) -> Result<Option<Blog>, StoreError> {
    let Some(blog) = store.delete_blog(id).await? else {
        return Ok(None);
    };

    let removed = store
        .delete_comments(&CommentFilter::by_blog(id))
        .await
        .inspect_err(|e| {
            tracing::error!(blog_id = %id, "Comment cleanup failed after blog delete: {}", e)
        })?;
    tracing::info!(blog_id = %id, comments = removed, "Blog deleted");

    Ok(Some(blog))
}

/// Deletes a user, the user's blogs with their comments, and every comment the
/// user wrote elsewhere. The two cascades are independent and both run.
pub async fn delete_user(store: &dyn Store, id: Uuid) -> Result<Option<User>, StoreError> {
    let Some(user) = store.delete_user(id).await? else {
        return Ok(None);
    };

    let result = cascade_user(store, id).await;
    if let Err(e) = &result {
        tracing::error!(user_id = %id, "Cleanup failed after user delete: {}", e);
    }
    result?;

    Ok(Some(user))
}

async fn cascade_user(store: &dyn Store, id: Uuid) -> Result<(), StoreError> {
    let authored = BlogFilter::by_author(id);
    let blog_ids: Vec<Uuid> = store
        .find_blogs(&authored)
        .await?
        .into_iter()
        .map(|b| b.id)
        .collect();

    let mut blog_comments = 0;
    if !blog_ids.is_empty() {
        blog_comments = store
            .delete_comments(&CommentFilter {
                blog_in: Some(blog_ids),
                ..CommentFilter::default()
            })
            .await?;
    }
    let blogs = store.delete_blogs(&authored).await?;
    let own_comments = store.delete_comments(&CommentFilter::by_user(id)).await?;

    tracing::info!(
        user_id = %id,
        blogs,
        comments = blog_comments + own_comments,
        "User deleted"
    );
    Ok(())
}
