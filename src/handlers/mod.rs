// src/handlers/mod.rs

pub mod blog;
pub mod user;

use axum::{Json, response::IntoResponse};
use serde_json::json;

/// `GET /` banner.
pub async fn index() -> impl IntoResponse {
    Json(json!({ "message": "Blog API - Version REST" }))
}

/// A required body field: present and not blank.
pub(crate) fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| !v.trim().is_empty())
}
