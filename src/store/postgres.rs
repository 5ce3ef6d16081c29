//! PostgreSQL-backed store.
//!
//! Dynamic predicates are assembled with `QueryBuilder`; each trait call issues
//! exactly one statement.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{BlogFilter, CommentFilter, DateBound, DateRange, Store, StoreError, UserFilter};
use crate::models::{
    blog::{Blog, BlogChanges, NewBlog},
    comment::{Comment, NewComment},
    user::{NewUser, User, UserChanges},
};

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, created_at, updated_at";
const BLOG_COLUMNS: &str = "id, title, author_id, content, created_at, updated_at";
const COMMENT_COLUMNS: &str = "id, blog_id, user_id, content, note, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn push_user_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    if let Some(id) = filter.id {
        builder.push(" AND id = ").push_bind(id);
    }
    if let Some(ids) = &filter.ids {
        builder.push(" AND id = ANY(").push_bind(ids.clone()).push(")");
    }
    if let Some(username) = &filter.username {
        builder.push(" AND username = ").push_bind(username.clone());
    }
    if let Some(email) = &filter.email {
        builder.push(" AND email = ").push_bind(email.clone());
    }
    if let Some(first_name) = &filter.first_name {
        builder.push(" AND first_name = ").push_bind(first_name.clone());
    }
    if let Some(last_name) = &filter.last_name {
        builder.push(" AND last_name = ").push_bind(last_name.clone());
    }
    if let Some(name) = &filter.name_contains {
        let needle = name.to_lowercase();
        builder
            .push(" AND (strpos(lower(COALESCE(first_name, '')), ")
            .push_bind(needle.clone())
            .push(") > 0 OR strpos(lower(COALESCE(last_name, '')), ")
            .push_bind(needle.clone())
            .push(") > 0 OR strpos(lower(username), ")
            .push_bind(needle)
            .push(") > 0)");
    }
}

fn push_date_range(builder: &mut QueryBuilder<'_, Postgres>, column: &str, range: &DateRange) {
    for (bound, op) in [(range.start, ">="), (range.end, "<=")] {
        match bound {
            None => {}
            Some(DateBound::At(at)) => {
                builder.push(format!(" AND {column} {op} ")).push_bind(at);
            }
            Some(DateBound::Invalid) => {
                builder.push(" AND FALSE");
            }
        }
    }
}

fn push_blog_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &BlogFilter) {
    if let Some(id) = filter.id {
        builder.push(" AND id = ").push_bind(id);
    }
    if let Some(ids) = &filter.id_in {
        builder.push(" AND id = ANY(").push_bind(ids.clone()).push(")");
    }
    if let Some(author) = filter.author {
        builder.push(" AND author_id = ").push_bind(author);
    }
    if let Some(authors) = &filter.author_in {
        builder
            .push(" AND author_id = ANY(")
            .push_bind(authors.clone())
            .push(")");
    }
    if let Some(content) = &filter.content {
        builder.push(" AND content = ").push_bind(content.clone());
    }
    if let Some(title) = &filter.title_contains {
        builder
            .push(" AND strpos(lower(title), ")
            .push_bind(title.to_lowercase())
            .push(") > 0");
    }
    push_date_range(builder, "created_at", &filter.created_at);
}

fn push_comment_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &CommentFilter) {
    if let Some(blog) = filter.blog {
        builder.push(" AND blog_id = ").push_bind(blog);
    }
    if let Some(blogs) = &filter.blog_in {
        builder
            .push(" AND blog_id = ANY(")
            .push_bind(blogs.clone())
            .push(")");
    }
    if let Some(user) = filter.user {
        builder.push(" AND user_id = ").push_bind(user);
    }
    if let Some(users) = &filter.user_in {
        builder
            .push(" AND user_id = ANY(")
            .push_bind(users.clone())
            .push(")");
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_users(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));
        push_user_filter(&mut builder, filter);
        builder.push(" ORDER BY seq");

        let users = builder.build_query_as::<User>().fetch_all(&self.pool).await?;
        Ok(users)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, username, email, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user.username)
        .bind(user.email)
        .bind(user.first_name)
        .bind(user.last_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_user(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        if changes.is_empty() {
            return self.find_user(id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE users SET ");
        let mut separated = builder.separated(", ");

        if let Some(username) = changes.username {
            separated.push("username = ");
            separated.push_bind_unseparated(username);
        }
        if let Some(email) = changes.email {
            separated.push("email = ");
            separated.push_bind_unseparated(email);
        }
        if let Some(first_name) = changes.first_name {
            separated.push("first_name = ");
            separated.push_bind_unseparated(first_name);
        }
        if let Some(last_name) = changes.last_name {
            separated.push("last_name = ");
            separated.push_bind_unseparated(last_name);
        }
        separated.push("updated_at = NOW()");

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {USER_COLUMNS}"));

        let user = builder
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_blogs(&self, filter: &BlogFilter) -> Result<Vec<Blog>, StoreError> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {BLOG_COLUMNS} FROM blogs WHERE TRUE"));
        push_blog_filter(&mut builder, filter);
        builder.push(" ORDER BY seq");

        let blogs = builder.build_query_as::<Blog>().fetch_all(&self.pool).await?;
        Ok(blogs)
    }

    async fn find_blog(&self, id: Uuid) -> Result<Option<Blog>, StoreError> {
        let blog = sqlx::query_as::<_, Blog>(&format!(
            "SELECT {BLOG_COLUMNS} FROM blogs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(blog)
    }

    async fn insert_blog(&self, blog: NewBlog) -> Result<Blog, StoreError> {
        let blog = sqlx::query_as::<_, Blog>(&format!(
            r#"
            INSERT INTO blogs (id, title, author_id, content)
            VALUES ($1, $2, $3, $4)
            RETURNING {BLOG_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(blog.title)
        .bind(blog.author)
        .bind(blog.content)
        .fetch_one(&self.pool)
        .await?;
        Ok(blog)
    }

    async fn update_blog(
        &self,
        id: Uuid,
        changes: BlogChanges,
    ) -> Result<Option<Blog>, StoreError> {
        if changes.is_empty() {
            return self.find_blog(id).await;
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE blogs SET ");
        let mut separated = builder.separated(", ");

        if let Some(title) = changes.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title);
        }
        if let Some(author) = changes.author {
            separated.push("author_id = ");
            separated.push_bind_unseparated(author);
        }
        if let Some(content) = changes.content {
            separated.push("content = ");
            separated.push_bind_unseparated(content);
        }
        separated.push("updated_at = NOW()");

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(format!(" RETURNING {BLOG_COLUMNS}"));

        let blog = builder
            .build_query_as::<Blog>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(blog)
    }

    async fn delete_blog(&self, id: Uuid) -> Result<Option<Blog>, StoreError> {
        let blog = sqlx::query_as::<_, Blog>(&format!(
            "DELETE FROM blogs WHERE id = $1 RETURNING {BLOG_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(blog)
    }

    async fn delete_blogs(&self, filter: &BlogFilter) -> Result<u64, StoreError> {
        let mut builder = QueryBuilder::new("DELETE FROM blogs WHERE TRUE");
        push_blog_filter(&mut builder, filter);

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn find_comments(&self, filter: &CommentFilter) -> Result<Vec<Comment>, StoreError> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE TRUE"));
        push_comment_filter(&mut builder, filter);
        builder.push(" ORDER BY seq");

        let comments = builder
            .build_query_as::<Comment>()
            .fetch_all(&self.pool)
            .await?;
        Ok(comments)
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments (id, blog_id, user_id, content, note)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(comment.blog)
        .bind(comment.user)
        .bind(comment.content)
        .bind(comment.note)
        .fetch_one(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn delete_comments(&self, filter: &CommentFilter) -> Result<u64, StoreError> {
        let mut builder = QueryBuilder::new("DELETE FROM comments WHERE TRUE");
        push_comment_filter(&mut builder, filter);

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn distinct_comment_blogs(
        &self,
        filter: &CommentFilter,
    ) -> Result<Vec<Uuid>, StoreError> {
        let mut builder = QueryBuilder::new("SELECT DISTINCT blog_id FROM comments WHERE TRUE");
        push_comment_filter(&mut builder, filter);

        let ids = builder
            .build_query_scalar::<Uuid>()
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}
