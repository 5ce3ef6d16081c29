// src/handlers/blog.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    cascade,
    error::{AppError, ErrorBody},
    extractors::json::AppJson,
    models::{
        blog::{
            BlogChanges, BlogDetail, BlogResponse, CreateBlogRequest, DeletedBlog, NewBlog,
            UpdateBlogRequest,
        },
        comment::{CommentResponse, CreateCommentRequest, NewComment},
    },
    query::{self, BlogQuery, populate},
    store::{CommentFilter, DynStore, Store},
    utils::{html::sanitize_content, id::parse_id},
};

use super::present;

/// Checks a referenced user exists. A malformed or dangling reference is a 400.
async fn existing_user(store: &dyn Store, raw: &str, missing: &str) -> Result<Uuid, AppError> {
    let id = Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(missing.to_string()))?;
    store
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::BadRequest(missing.to_string()))?;
    Ok(id)
}

/// Sanitizes content that already passed validation. Markup that cleans down
/// to nothing is rejected.
fn clean_content(raw: &str) -> Result<String, AppError> {
    let content = sanitize_content(raw);
    if content.is_empty() {
        return Err(AppError::BadRequest(
            "Content is empty after sanitization".to_string(),
        ));
    }
    Ok(content)
}

/// List blogs with filtering and sorting.
#[utoipa::path(
    get,
    path = "/blogs",
    tag = "Blogs",
    params(
        ("title" = Option<String>, Query, description = "Case-insensitive substring of the title"),
        ("authorName" = Option<String>, Query, description = "Substring of the author's first name, last name or username"),
        ("commenterName" = Option<String>, Query, description = "Substring of any commenter's first name, last name or username"),
        ("startDate" = Option<String>, Query, description = "Inclusive lower bound on createdAt"),
        ("endDate" = Option<String>, Query, description = "Inclusive upper bound on createdAt"),
        ("sort" = Option<String>, Query, description = "title|createdAt|updatedAt|authorName|commentsCount|avgNote, suffixed with _asc or _desc"),
        ("id" = Option<String>, Query, description = "Exact blog id"),
        ("author" = Option<String>, Query, description = "Exact author id"),
        ("content" = Option<String>, Query, description = "Exact content"),
    ),
    responses(
        (status = 200, description = "Matching blogs, author populated", body = Vec<BlogResponse>),
        (status = 400, description = "Unknown parameter or malformed id", body = ErrorBody),
        (status = 500, description = "Store error", body = ErrorBody),
    )
)]
pub async fn list_blogs(
    State(store): State<DynStore>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let parsed = BlogQuery::from_params(params)?;

    let blogs = query::list_blogs(store.as_ref(), &parsed).await.map_err(|e| {
        tracing::error!("Failed to list blogs: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(blogs))
}

/// Get a single blog with author and comments populated.
#[utoipa::path(
    get,
    path = "/blogs/{id}",
    tag = "Blogs",
    params(("id" = String, Path, description = "Blog id")),
    responses(
        (status = 200, body = BlogDetail),
        (status = 400, description = "Invalid ID format", body = ErrorBody),
        (status = 404, description = "Blog not found", body = ErrorBody),
    )
)]
pub async fn get_blog(
    State(store): State<DynStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let store = store.as_ref();

    let blog = store
        .find_blog(id)
        .await?
        .ok_or(AppError::NotFound("Blog not found".to_string()))?;

    let blog = populate::populate_blog(store, blog).await?;
    let comments = store.find_comments(&CommentFilter::by_blog(id)).await?;
    let comments = populate::populate_comments(store, comments).await?;

    Ok(Json(BlogDetail::new(blog, comments)))
}

/// Create a new blog.
#[utoipa::path(
    post,
    path = "/blogs",
    tag = "Blogs",
    request_body = CreateBlogRequest,
    responses(
        (status = 201, description = "Blog created", body = BlogResponse),
        (status = 400, description = "Missing field, validation failure or unknown author", body = ErrorBody),
    )
)]
pub async fn create_blog(
    State(store): State<DynStore>,
    AppJson(mut payload): AppJson<CreateBlogRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.normalize();

    let (Some(title), Some(author), Some(content)) = (
        present(&payload.title),
        present(&payload.author),
        present(&payload.content),
    ) else {
        return Err(AppError::BadRequest(
            "Title, author, and content are required".to_string(),
        ));
    };

    payload.validate()?;
    let content = clean_content(content)?;

    let store = store.as_ref();
    let author = existing_user(store, author, "Author not found").await?;

    let blog = store
        .insert_blog(NewBlog {
            title: title.to_string(),
            author,
            content,
        })
        .await
        .map_err(|e| {
            tracing::error!("Failed to create blog: {:?}", e);
            AppError::from(e)
        })?;

    let blog = populate::populate_blog(store, blog).await?;

    Ok((StatusCode::CREATED, Json(blog)))
}

/// Update a blog. Only the fields present in the body change.
#[utoipa::path(
    put,
    path = "/blogs/{id}",
    tag = "Blogs",
    params(("id" = String, Path, description = "Blog id")),
    request_body = UpdateBlogRequest,
    responses(
        (status = 200, description = "Updated blog", body = BlogResponse),
        (status = 400, description = "Invalid id, validation failure or unknown author", body = ErrorBody),
        (status = 404, description = "Blog not found", body = ErrorBody),
    )
)]
pub async fn update_blog(
    State(store): State<DynStore>,
    Path(id): Path<String>,
    AppJson(mut payload): AppJson<UpdateBlogRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    payload.normalize();
    payload.validate()?;
    let content = payload.content.as_deref().map(clean_content).transpose()?;

    let store = store.as_ref();
    let author = match payload.author.as_deref() {
        Some(raw) => Some(existing_user(store, raw, "Author not found").await?),
        None => None,
    };

    let changes = BlogChanges {
        title: payload.title,
        author,
        content,
    };

    let blog = store
        .update_blog(id, changes)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update blog: {:?}", e);
            AppError::from(e)
        })?
        .ok_or(AppError::NotFound("Blog not found".to_string()))?;

    let blog = populate::populate_blog(store, blog).await?;

    Ok(Json(blog))
}

/// Delete a blog and its comments.
#[utoipa::path(
    delete,
    path = "/blogs/{id}",
    tag = "Blogs",
    params(("id" = String, Path, description = "Blog id")),
    responses(
        (status = 200, description = "Blog deleted", body = DeletedBlog),
        (status = 400, description = "Invalid ID format", body = ErrorBody),
        (status = 404, description = "Blog not found", body = ErrorBody),
    )
)]
pub async fn delete_blog(
    State(store): State<DynStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    let blog = cascade::delete_blog(store.as_ref(), id)
        .await?
        .ok_or(AppError::NotFound("Blog not found".to_string()))?;

    Ok(Json(DeletedBlog {
        message: "Blog deleted successfully".to_string(),
        blog,
    }))
}

/// List all comments of a blog.
#[utoipa::path(
    get,
    path = "/blogs/{id}/comments",
    tag = "Comments",
    params(("id" = String, Path, description = "Blog id")),
    responses(
        (status = 200, body = Vec<CommentResponse>),
        (status = 400, description = "Invalid ID format", body = ErrorBody),
        (status = 404, description = "Blog not found", body = ErrorBody),
    )
)]
pub async fn list_comments(
    State(store): State<DynStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let store = store.as_ref();

    store
        .find_blog(id)
        .await?
        .ok_or(AppError::NotFound("Blog not found".to_string()))?;

    let comments = store.find_comments(&CommentFilter::by_blog(id)).await?;
    let comments = populate::populate_comments(store, comments).await?;

    Ok(Json(comments))
}

/// Add a comment to a blog.
#[utoipa::path(
    post,
    path = "/blogs/{id}/comments",
    tag = "Comments",
    params(("id" = String, Path, description = "Blog id")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Missing field, bad note or unknown user", body = ErrorBody),
        (status = 404, description = "Blog not found", body = ErrorBody),
    )
)]
pub async fn add_comment(
    State(store): State<DynStore>,
    Path(id): Path<String>,
    AppJson(mut payload): AppJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    payload.user = payload.user.map(|u| u.trim().to_string());
    payload.content = payload.content.map(|c| c.trim().to_string());

    let (Some(user), Some(content)) = (present(&payload.user), present(&payload.content)) else {
        return Err(AppError::BadRequest(
            "User and content are required".to_string(),
        ));
    };

    payload.validate()?;
    let content = clean_content(content)?;

    let store = store.as_ref();
    store
        .find_blog(id)
        .await?
        .ok_or(AppError::NotFound("Blog not found".to_string()))?;

    let user = existing_user(store, user, "User not found").await?;

    let comment = store
        .insert_comment(NewComment {
            blog: id,
            user,
            content,
            note: payload.note,
        })
        .await
        .map_err(|e| {
            tracing::error!("Failed to create comment: {:?}", e);
            AppError::from(e)
        })?;

    let mut populated = populate::populate_comments(store, vec![comment]).await?;
    let comment = populated
        .pop()
        .ok_or(AppError::InternalServerError("Comment vanished after insert".to_string()))?;

    Ok((StatusCode::CREATED, Json(comment)))
}
