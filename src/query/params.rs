//! Turns the raw query string of the list endpoints into typed predicates.
//!
//! The set of keys is closed: reserved keys get their own semantics, a small
//! list of document fields are matched for equality, and anything else is
//! rejected.

use std::{cmp::Ordering, collections::HashMap, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
    error::AppError,
    store::{BlogFilter, DateBound, UserFilter},
    utils::id::parse_id,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Applies the direction to an ascending comparison.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// A `field_direction` sort request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey<F> {
    pub field: F,
    pub direction: SortDirection,
}

impl<F: FromStr<Err = AppError>> FromStr for SortKey<F> {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match raw.split_once('_') {
            Some((field, direction)) => (field, Some(direction)),
            None => (raw, None),
        };
        let direction = match direction {
            Some("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        };
        Ok(Self {
            field: field.parse()?,
            direction,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlogSortField {
    Title,
    CreatedAt,
    UpdatedAt,
    AuthorName,
    CommentsCount,
    AvgNote,
}

impl FromStr for BlogSortField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(Self::Title),
            "createdAt" => Ok(Self::CreatedAt),
            "updatedAt" => Ok(Self::UpdatedAt),
            "authorName" => Ok(Self::AuthorName),
            "commentsCount" => Ok(Self::CommentsCount),
            "avgNote" => Ok(Self::AvgNote),
            other => Err(unsupported_sort(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    Username,
    CreatedAt,
    UpdatedAt,
    CommentsCount,
}

impl FromStr for UserSortField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "username" => Ok(Self::Username),
            "createdAt" => Ok(Self::CreatedAt),
            "updatedAt" => Ok(Self::UpdatedAt),
            "commentsCount" => Ok(Self::CommentsCount),
            other => Err(unsupported_sort(other)),
        }
    }
}

fn unsupported_sort(field: &str) -> AppError {
    AppError::BadRequest(format!("Unsupported sort field: {field}"))
}

fn unknown_param(key: &str) -> AppError {
    AppError::BadRequest(format!("Unknown query parameter: {key}"))
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Parses a `startDate` / `endDate` value.
///
/// Accepts RFC 3339 timestamps and plain `YYYY-MM-DD` dates (UTC midnight).
/// Anything else yields `DateBound::Invalid`, which matches no document.
pub fn parse_date(raw: &str) -> DateBound {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return DateBound::At(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| DateBound::At(at.and_utc()))
        .unwrap_or(DateBound::Invalid)
}

/// Parsed `GET /blogs` query.
///
/// `filter` holds everything that maps directly onto the blog collection.
/// The name filters still need a lookup against users (and comments) before
/// they become predicate clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogQuery {
    pub filter: BlogFilter,
    pub author_name: Option<String>,
    pub commenter_name: Option<String>,
    pub sort: Option<SortKey<BlogSortField>>,
}

impl BlogQuery {
    pub fn from_params(params: HashMap<String, String>) -> Result<Self, AppError> {
        let mut query = Self::default();

        for (key, value) in params {
            match key.as_str() {
                "title" => query.filter.title_contains = non_empty(value),
                "authorName" => query.author_name = non_empty(value),
                "commenterName" => query.commenter_name = non_empty(value),
                "startDate" => {
                    query.filter.created_at.start = non_empty(value).map(|v| parse_date(&v));
                }
                "endDate" => {
                    query.filter.created_at.end = non_empty(value).map(|v| parse_date(&v));
                }
                "sort" => query.sort = non_empty(value).map(|v| v.parse()).transpose()?,
                "id" => query.filter.id = Some(parse_id(&value)?),
                "author" => query.filter.author = Some(parse_id(&value)?),
                "content" => query.filter.content = Some(value),
                other => return Err(unknown_param(other)),
            }
        }

        Ok(query)
    }
}

/// Parsed `GET /users` query. Only equality filters and `sort`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserQuery {
    pub filter: UserFilter,
    pub sort: Option<SortKey<UserSortField>>,
}

impl UserQuery {
    pub fn from_params(params: HashMap<String, String>) -> Result<Self, AppError> {
        let mut query = Self::default();

        for (key, value) in params {
            match key.as_str() {
                "sort" => query.sort = non_empty(value).map(|v| v.parse()).transpose()?,
                "id" => query.filter.id = Some(parse_id(&value)?),
                "username" => query.filter.username = Some(value),
                "email" => query.filter.email = Some(value.trim().to_lowercase()),
                "firstName" => query.filter.first_name = Some(value),
                "lastName" => query.filter.last_name = Some(value),
                other => return Err(unknown_param(other)),
            }
        }

        Ok(query)
    }
}
