// src/handlers/user.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    cascade,
    error::{AppError, ErrorBody},
    extractors::json::AppJson,
    models::{
        blog::BlogResponse,
        comment::CommentResponse,
        user::{CreateUserRequest, DeletedUser, NewUser, UpdateUserRequest, User},
    },
    query::{self, UserQuery, populate},
    store::{BlogFilter, CommentFilter, DynStore, Store},
    utils::id::parse_id,
};

use super::present;

async fn require_user(store: &dyn Store, id: &str) -> Result<User, AppError> {
    let id = parse_id(id)?;
    store
        .find_user(id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))
}

/// List users, with equality filters and optional sort.
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    params(
        ("sort" = Option<String>, Query, description = "username|createdAt|updatedAt|commentsCount, suffixed with _asc or _desc"),
        ("id" = Option<String>, Query, description = "Exact user id"),
        ("username" = Option<String>, Query, description = "Exact username"),
        ("email" = Option<String>, Query, description = "Exact email"),
        ("firstName" = Option<String>, Query, description = "Exact first name"),
        ("lastName" = Option<String>, Query, description = "Exact last name"),
    ),
    responses(
        (status = 200, body = Vec<User>),
        (status = 400, description = "Unknown parameter or malformed id", body = ErrorBody),
        (status = 500, description = "Store error", body = ErrorBody),
    )
)]
pub async fn list_users(
    State(store): State<DynStore>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let parsed = UserQuery::from_params(params)?;

    let users = query::list_users(store.as_ref(), &parsed).await.map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, body = User),
        (status = 400, description = "Invalid ID format", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    )
)]
pub async fn get_user(
    State(store): State<DynStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(store.as_ref(), &id).await?;
    Ok(Json(user))
}

/// Create a new user. Username and email must be unique.
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Missing field, validation failure or duplicate username/email", body = ErrorBody),
    )
)]
pub async fn create_user(
    State(store): State<DynStore>,
    AppJson(mut payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.normalize();

    let (Some(username), Some(email)) = (present(&payload.username), present(&payload.email))
    else {
        return Err(AppError::BadRequest(
            "Username and email are required".to_string(),
        ));
    };

    payload.validate()?;

    let user = store
        .insert_user(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            first_name: payload.first_name.clone(),
            last_name: payload.last_name.clone(),
        })
        .await
        .map_err(|e| {
            tracing::warn!("Failed to create user: {:?}", e);
            AppError::from(e)
        })?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Update a user. Only the fields present in the body change.
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Invalid id, validation failure or duplicate username/email", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    )
)]
pub async fn update_user(
    State(store): State<DynStore>,
    Path(id): Path<String>,
    AppJson(mut payload): AppJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    payload.normalize();
    payload.validate()?;

    let user = store
        .update_user(id, payload.into())
        .await
        .map_err(|e| {
            tracing::warn!("Failed to update user: {:?}", e);
            AppError::from(e)
        })?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Delete a user, the user's blogs and every comment the user wrote.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = DeletedUser),
        (status = 400, description = "Invalid ID format", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    )
)]
pub async fn delete_user(
    State(store): State<DynStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;

    let user = cascade::delete_user(store.as_ref(), id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(DeletedUser {
        message: "User deleted successfully".to_string(),
        user,
    }))
}

/// Comments written by a user, across all blogs.
#[utoipa::path(
    get,
    path = "/users/{id}/comments",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, body = Vec<CommentResponse>),
        (status = 400, description = "Invalid ID format", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    )
)]
pub async fn list_user_comments(
    State(store): State<DynStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let store = store.as_ref();
    let user = require_user(store, &id).await?;

    let comments = store.find_comments(&CommentFilter::by_user(user.id)).await?;
    let comments = populate::populate_comments(store, comments).await?;

    Ok(Json(comments))
}

/// Blogs authored by a user.
#[utoipa::path(
    get,
    path = "/users/{id}/blogs",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, body = Vec<BlogResponse>),
        (status = 400, description = "Invalid ID format", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
    )
)]
pub async fn list_user_blogs(
    State(store): State<DynStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let store = store.as_ref();
    let user = require_user(store, &id).await?;

    let blogs = store.find_blogs(&BlogFilter::by_author(user.id)).await?;
    let blogs = populate::populate_blogs(store, blogs).await?;

    Ok(Json(blogs))
}
