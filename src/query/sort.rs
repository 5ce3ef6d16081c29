//! In-memory ordering of already-fetched results.
//!
//! All sorts are stable: ties keep store iteration order.
//!
//! `commentsCount` and `avgNote` are not stored fields. Before sorting, every
//! comment of every candidate blog (or user) is loaded in one batched lookup
//! and aggregated here, so the cost grows with the total number of comments on
//! the result set.

use std::{cmp::Ordering, collections::HashMap, sync::LazyLock};

use icu_collator::{Collator, CollatorBorrowed, options::CollatorOptions};
use uuid::Uuid;

use super::params::{BlogSortField, SortKey, UserSortField};
use crate::{
    models::{blog::BlogResponse, comment::Comment, user::User},
    store::{CommentFilter, Store, StoreError},
};

/// Comment count and note total for one blog or user.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoteStats {
    pub count: usize,
    pub sum: i64,
}

impl NoteStats {
    /// Mean note. Comments without a note count as 0; no comments means 0.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum as f64 / self.count as f64
        }
    }
}

/// Groups comments by the key `group` extracts (blog or user id).
pub fn note_stats(
    comments: &[Comment],
    group: impl Fn(&Comment) -> Uuid,
) -> HashMap<Uuid, NoteStats> {
    let mut stats: HashMap<Uuid, NoteStats> = HashMap::new();
    for comment in comments {
        let entry = stats.entry(group(comment)).or_default();
        entry.count += 1;
        entry.sum += i64::from(comment.note.unwrap_or(0));
    }
    stats
}

/// Root-locale collator (compiled data, tertiary strength).
static COLLATOR: LazyLock<Option<CollatorBorrowed<'static>>> = LazyLock::new(|| {
    Collator::try_new(Default::default(), CollatorOptions::default())
        .inspect_err(|e| {
            tracing::warn!("Collator unavailable, falling back to case folding: {}", e)
        })
        .ok()
});

/// Locale-aware string order: accents are secondary differences and lower
/// case sorts before upper case on ties.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    match COLLATOR.as_ref() {
        Some(collator) => collator.compare(a, b),
        None => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| b.cmp(a)),
    }
}

/// `lastName + firstName` of the populated author, empty when unresolved.
fn author_sort_name(blog: &BlogResponse) -> String {
    match &blog.author {
        Some(author) => format!(
            "{}{}",
            author.last_name.as_deref().unwrap_or(""),
            author.first_name.as_deref().unwrap_or("")
        ),
        None => String::new(),
    }
}

/// Sorts blogs in place. Aggregate keys trigger one extra comment lookup.
pub async fn sort_blogs(
    store: &dyn Store,
    blogs: &mut [BlogResponse],
    key: SortKey<BlogSortField>,
) -> Result<(), StoreError> {
    let direction = key.direction;

    match key.field {
        BlogSortField::Title => {
            blogs.sort_by(|a, b| direction.apply(locale_cmp(&a.title, &b.title)));
        }
        BlogSortField::CreatedAt => {
            blogs.sort_by(|a, b| direction.apply(a.created_at.cmp(&b.created_at)));
        }
        BlogSortField::UpdatedAt => {
            blogs.sort_by(|a, b| direction.apply(a.updated_at.cmp(&b.updated_at)));
        }
        BlogSortField::AuthorName => {
            let names: HashMap<Uuid, String> =
                blogs.iter().map(|b| (b.id, author_sort_name(b))).collect();
            blogs.sort_by(|a, b| direction.apply(locale_cmp(&names[&a.id], &names[&b.id])));
        }
        BlogSortField::CommentsCount | BlogSortField::AvgNote => {
            if blogs.is_empty() {
                return Ok(());
            }
            let filter = CommentFilter {
                blog_in: Some(blogs.iter().map(|b| b.id).collect()),
                ..CommentFilter::default()
            };
            let comments = store.find_comments(&filter).await?;
            let stats = note_stats(&comments, |c| c.blog);
            let stat = |id: &Uuid| stats.get(id).copied().unwrap_or_default();

            if key.field == BlogSortField::CommentsCount {
                blogs.sort_by(|a, b| direction.apply(stat(&a.id).count.cmp(&stat(&b.id).count)));
            } else {
                blogs.sort_by(|a, b| {
                    direction.apply(stat(&a.id).average().total_cmp(&stat(&b.id).average()))
                });
            }
        }
    }

    Ok(())
}

/// Sorts users in place. `commentsCount` triggers one extra comment lookup.
pub async fn sort_users(
    store: &dyn Store,
    users: &mut [User],
    key: SortKey<UserSortField>,
) -> Result<(), StoreError> {
    let direction = key.direction;

    match key.field {
        UserSortField::Username => {
            users.sort_by(|a, b| direction.apply(a.username.cmp(&b.username)));
        }
        UserSortField::CreatedAt => {
            users.sort_by(|a, b| direction.apply(a.created_at.cmp(&b.created_at)));
        }
        UserSortField::UpdatedAt => {
            users.sort_by(|a, b| direction.apply(a.updated_at.cmp(&b.updated_at)));
        }
        UserSortField::CommentsCount => {
            if users.is_empty() {
                return Ok(());
            }
            let filter = CommentFilter {
                user_in: Some(users.iter().map(|u| u.id).collect()),
                ..CommentFilter::default()
            };
            let comments = store.find_comments(&filter).await?;
            let stats = note_stats(&comments, |c| c.user);
            let count = |id: &Uuid| stats.get(id).map_or(0, |s| s.count);

            users.sort_by(|a, b| direction.apply(count(&a.id).cmp(&count(&b.id))));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::AuthorSummary;
    use crate::query::params::SortDirection;
    use crate::store::MemoryStore;
    use chrono::Utc;

    fn blog(title: &str, author: Option<(&str, &str)>) -> BlogResponse {
        let now = Utc::now();
        BlogResponse {
            id: Uuid::new_v4(),
            title: title.to_string(),
            author: author.map(|(first, last)| AuthorSummary {
                id: Uuid::new_v4(),
                username: format!("{first}{last}"),
                email: format!("{first}@x.io"),
                first_name: Some(first.to_string()),
                last_name: Some(last.to_string()),
            }),
            content: "irrelevant content".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn comment(blog: Uuid, note: Option<i32>) -> Comment {
        let now = Utc::now();
        Comment {
            id: Uuid::new_v4(),
            blog,
            user: Uuid::new_v4(),
            content: "c".to_string(),
            note,
            created_at: now,
            updated_at: now,
        }
    }

    fn titles(blogs: &[BlogResponse]) -> Vec<&str> {
        blogs.iter().map(|b| b.title.as_str()).collect()
    }

    fn key(field: BlogSortField, direction: SortDirection) -> SortKey<BlogSortField> {
        SortKey { field, direction }
    }

    #[test]
    fn average_counts_missing_notes_as_zero() {
        let id = Uuid::new_v4();
        let comments = vec![comment(id, Some(4)), comment(id, None)];
        let stats = note_stats(&comments, |c| c.blog);
        assert_eq!(stats[&id].count, 2);
        assert_eq!(stats[&id].average(), 2.0);
        assert_eq!(NoteStats::default().average(), 0.0);
    }

    #[test]
    fn locale_cmp_ignores_case_first() {
        assert_eq!(locale_cmp("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_cmp("a", "A"), Ordering::Less);
        assert_eq!(locale_cmp("same", "same"), Ordering::Equal);
    }

    #[test]
    fn locale_cmp_places_accents_with_their_base_letter() {
        assert_eq!(locale_cmp("Émile", "Zed"), Ordering::Less);
        assert_eq!(locale_cmp("Emile", "Émile"), Ordering::Less);
        assert_eq!(locale_cmp("Élan", "Emile"), Ordering::Less);
        assert_eq!(locale_cmp("über", "zebra"), Ordering::Less);
    }

    #[tokio::test]
    async fn accented_titles_and_authors_sort_alphabetically() {
        let store = MemoryStore::new();
        let mut blogs = vec![
            blog("Zebra crossings", Some(("Zed", "Zulu"))),
            blog("Éclairs at home", Some(("Émile", "Érard"))),
            blog("apple pie", Some(("Ada", "Lovelace"))),
        ];

        sort_blogs(&store, &mut blogs, key(BlogSortField::Title, SortDirection::Asc))
            .await
            .unwrap();
        assert_eq!(titles(&blogs), ["apple pie", "Éclairs at home", "Zebra crossings"]);

        sort_blogs(&store, &mut blogs, key(BlogSortField::AuthorName, SortDirection::Asc))
            .await
            .unwrap();
        assert_eq!(titles(&blogs), ["Éclairs at home", "apple pie", "Zebra crossings"]);
    }

    #[tokio::test]
    async fn title_sort_is_case_insensitive_and_reversible() {
        let store = MemoryStore::new();
        let mut blogs = vec![blog("beta", None), blog("Alpha", None), blog("gamma", None)];

        sort_blogs(&store, &mut blogs, key(BlogSortField::Title, SortDirection::Asc))
            .await
            .unwrap();
        assert_eq!(titles(&blogs), ["Alpha", "beta", "gamma"]);

        sort_blogs(&store, &mut blogs, key(BlogSortField::Title, SortDirection::Desc))
            .await
            .unwrap();
        assert_eq!(titles(&blogs), ["gamma", "beta", "Alpha"]);
    }

    #[tokio::test]
    async fn unresolved_author_sorts_first_ascending() {
        let store = MemoryStore::new();
        let mut blogs = vec![
            blog("by zed", Some(("Zed", "Zulu"))),
            blog("orphan", None),
            blog("by ada", Some(("Ada", "Lovelace"))),
        ];

        sort_blogs(&store, &mut blogs, key(BlogSortField::AuthorName, SortDirection::Asc))
            .await
            .unwrap();
        assert_eq!(titles(&blogs), ["orphan", "by ada", "by zed"]);
    }

    #[tokio::test]
    async fn ties_keep_original_order() {
        let store = MemoryStore::new();
        let mut blogs = vec![blog("same", None), blog("Same", None), blog("aaa", None)];
        let first = blogs[0].id;

        sort_blogs(&store, &mut blogs, key(BlogSortField::CommentsCount, SortDirection::Desc))
            .await
            .unwrap();
        assert_eq!(blogs[0].id, first);
        assert_eq!(titles(&blogs), ["same", "Same", "aaa"]);
    }
}
