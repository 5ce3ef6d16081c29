use uuid::Uuid;

use crate::error::AppError;

/// Parses a path or query identity key.
/// A malformed id is always a 400, never a 404.
pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::BadRequest("Invalid ID format".to_string()))
}
