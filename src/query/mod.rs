//! Query composition for the list endpoints.
//!
//! A listing runs in a fixed order because every step consumes the previous
//! one's output: resolve name filters, fetch the primary collection, populate
//! references, then sort.

pub mod params;
pub mod populate;
pub mod resolver;
pub mod sort;

use crate::{
    models::{blog::BlogResponse, user::User},
    store::{Store, StoreError},
};

pub use params::{BlogQuery, UserQuery};

pub async fn list_blogs(
    store: &dyn Store,
    query: &BlogQuery,
) -> Result<Vec<BlogResponse>, StoreError> {
    let filter = resolver::compose_blog_filter(store, query).await?;
    let blogs = store.find_blogs(&filter).await?;
    let mut blogs = populate::populate_blogs(store, blogs).await?;

    if let Some(key) = query.sort {
        sort::sort_blogs(store, &mut blogs, key).await?;
    }

    Ok(blogs)
}

pub async fn list_users(store: &dyn Store, query: &UserQuery) -> Result<Vec<User>, StoreError> {
    let mut users = store.find_users(&query.filter).await?;

    if let Some(key) = query.sort {
        sort::sort_users(store, &mut users, key).await?;
    }

    Ok(users)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::models::{blog::NewBlog, comment::NewComment, user::NewUser};
    use crate::store::MemoryStore;

    async fn user(store: &MemoryStore, username: &str, first: &str) -> User {
        store
            .insert_user(NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                first_name: Some(first.to_string()),
                last_name: None,
            })
            .await
            .unwrap()
    }

    async fn blog(store: &MemoryStore, title: &str, author: &User) -> uuid::Uuid {
        store
            .insert_blog(NewBlog {
                title: title.to_string(),
                author: author.id,
                content: "long enough content".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    async fn comment(store: &MemoryStore, blog: uuid::Uuid, user: &User, note: Option<i32>) {
        store
            .insert_comment(NewComment {
                blog,
                user: user.id,
                content: "nice".to_string(),
                note,
            })
            .await
            .unwrap();
    }

    fn query(pairs: &[(&str, &str)]) -> BlogQuery {
        let params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BlogQuery::from_params(params).unwrap()
    }

    fn titles(blogs: &[BlogResponse]) -> Vec<String> {
        blogs.iter().map(|b| b.title.clone()).collect()
    }

    #[tokio::test]
    async fn author_and_commenter_filters_compose() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada_l", "Ada").await;
        let bob = user(&store, "bobby", "Bob").await;

        let b1 = blog(&store, "Ada writes Rust", &ada).await;
        let b2 = blog(&store, "Bob writes Go", &bob).await;
        comment(&store, b2, &ada, Some(5)).await;
        comment(&store, b1, &bob, None).await;

        let found = list_blogs(&store, &query(&[("authorName", "ADA")])).await.unwrap();
        assert_eq!(titles(&found), ["Ada writes Rust"]);
        assert_eq!(found[0].author.as_ref().unwrap().username, "ada_l");

        let found = list_blogs(&store, &query(&[("commenterName", "ada")])).await.unwrap();
        assert_eq!(titles(&found), ["Bob writes Go"]);

        let found = list_blogs(&store, &query(&[("commenterName", "ada"), ("authorName", "ada")]))
            .await
            .unwrap();
        assert!(found.is_empty());

        let found = list_blogs(&store, &query(&[("commenterName", "nobody")])).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn avg_note_orders_reverse_each_other() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada_l", "Ada").await;

        let quiet = blog(&store, "No comments", &ada).await;
        let good = blog(&store, "All fives", &ada).await;
        let mixed = blog(&store, "Mixed notes", &ada).await;
        comment(&store, good, &ada, Some(5)).await;
        comment(&store, good, &ada, Some(5)).await;
        comment(&store, mixed, &ada, Some(4)).await;
        comment(&store, mixed, &ada, None).await;
        let _ = quiet;

        let asc = list_blogs(&store, &query(&[("sort", "avgNote_asc")])).await.unwrap();
        let desc = list_blogs(&store, &query(&[("sort", "avgNote_desc")])).await.unwrap();
        assert_eq!(titles(&asc), ["No comments", "Mixed notes", "All fives"]);

        let mut reversed = titles(&desc);
        reversed.reverse();
        assert_eq!(titles(&asc), reversed);

        let by_count = list_blogs(&store, &query(&[("sort", "commentsCount_desc")]))
            .await
            .unwrap();
        assert_eq!(by_count.last().unwrap().title, "No comments");
    }

    #[tokio::test]
    async fn users_sort_by_comment_count() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada_l", "Ada").await;
        let bob = user(&store, "bobby", "Bob").await;
        let b = blog(&store, "A blog post", &ada).await;
        comment(&store, b, &bob, None).await;
        comment(&store, b, &bob, None).await;

        let query = UserQuery::from_params(
            [("sort".to_string(), "commentsCount_desc".to_string())].into(),
        )
        .unwrap();
        let users = list_users(&store, &query).await.unwrap();
        let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["bobby", "ada_l"]);
    }
}
