//! In-process store. Used when no `DATABASE_URL` is configured, and by the tests.

use async_trait::async_trait;
use chrono::Utc;
use regex::{Regex, RegexBuilder};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BlogFilter, CommentFilter, Store, StoreError, UserFilter};
use crate::models::{
    blog::{Blog, BlogChanges, NewBlog},
    comment::{Comment, NewComment},
    user::{NewUser, User, UserChanges},
};

#[derive(Debug, Default)]
struct Collections {
    users: Vec<User>,
    blogs: Vec<Blog>,
    comments: Vec<Comment>,
}

/// Vec-backed collections. Iteration order is insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Case-insensitive literal substring matcher. Built once per query.
fn literal_ci(needle: &str) -> Result<Regex, StoreError> {
    RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .map_err(|e| StoreError::Database(e.to_string()))
}

fn literal_ci_opt(needle: Option<&str>) -> Result<Option<Regex>, StoreError> {
    needle.map(literal_ci).transpose()
}

fn one_of(set: &Option<Vec<Uuid>>, id: Uuid) -> bool {
    set.as_ref().is_none_or(|ids| ids.contains(&id))
}

fn equals<T: PartialEq>(expected: &Option<T>, actual: &T) -> bool {
    expected.as_ref().is_none_or(|e| e == actual)
}

fn equals_opt(expected: &Option<String>, actual: &Option<String>) -> bool {
    match expected {
        None => true,
        Some(e) => actual.as_deref() == Some(e.as_str()),
    }
}

/// A `UserFilter` with its name pattern compiled.
struct UserMatcher<'a> {
    filter: &'a UserFilter,
    name: Option<Regex>,
}

impl<'a> UserMatcher<'a> {
    fn new(filter: &'a UserFilter) -> Result<Self, StoreError> {
        Ok(Self {
            filter,
            name: literal_ci_opt(filter.name_contains.as_deref())?,
        })
    }

    fn matches(&self, user: &User) -> bool {
        let filter = self.filter;
        let name_ok = self.name.as_ref().is_none_or(|re| {
            re.is_match(&user.username)
                || user.first_name.as_deref().is_some_and(|f| re.is_match(f))
                || user.last_name.as_deref().is_some_and(|l| re.is_match(l))
        });

        equals(&filter.id, &user.id)
            && one_of(&filter.ids, user.id)
            && equals(&filter.username, &user.username)
            && equals(&filter.email, &user.email)
            && equals_opt(&filter.first_name, &user.first_name)
            && equals_opt(&filter.last_name, &user.last_name)
            && name_ok
    }
}

/// A `BlogFilter` with its title pattern compiled.
struct BlogMatcher<'a> {
    filter: &'a BlogFilter,
    title: Option<Regex>,
}

impl<'a> BlogMatcher<'a> {
    fn new(filter: &'a BlogFilter) -> Result<Self, StoreError> {
        Ok(Self {
            filter,
            title: literal_ci_opt(filter.title_contains.as_deref())?,
        })
    }

    fn matches(&self, blog: &Blog) -> bool {
        let filter = self.filter;
        equals(&filter.id, &blog.id)
            && one_of(&filter.id_in, blog.id)
            && equals(&filter.author, &blog.author)
            && one_of(&filter.author_in, blog.author)
            && equals(&filter.content, &blog.content)
            && self.title.as_ref().is_none_or(|re| re.is_match(&blog.title))
            && filter.created_at.contains(blog.created_at)
    }
}

fn comment_matches(filter: &CommentFilter, comment: &Comment) -> bool {
    equals(&filter.blog, &comment.blog)
        && one_of(&filter.blog_in, comment.blog)
        && equals(&filter.user, &comment.user)
        && one_of(&filter.user_in, comment.user)
}

/// Emulates the unique indexes on username and email.
fn check_unique(
    users: &[User],
    skip: Option<Uuid>,
    username: Option<&str>,
    email: Option<&str>,
) -> Result<(), StoreError> {
    let taken = users.iter().filter(|u| Some(u.id) != skip).any(|u| {
        username.is_some_and(|n| u.username == n) || email.is_some_and(|e| u.email == e)
    });
    if taken {
        return Err(StoreError::Conflict);
    }
    Ok(())
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_users(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError> {
        let matcher = UserMatcher::new(filter)?;
        let db = self.inner.read().await;
        Ok(db
            .users
            .iter()
            .filter(|u| matcher.matches(u))
            .cloned()
            .collect())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let db = self.inner.read().await;
        Ok(db.users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut db = self.inner.write().await;
        check_unique(&db.users, None, Some(&user.username), Some(&user.email))?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: now,
            updated_at: now,
        };
        db.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        let mut db = self.inner.write().await;
        let Some(pos) = db.users.iter().position(|u| u.id == id) else {
            return Ok(None);
        };
        check_unique(
            &db.users,
            Some(id),
            changes.username.as_deref(),
            changes.email.as_deref(),
        )?;

        let user = &mut db.users[pos];
        if changes.is_empty() {
            return Ok(Some(user.clone()));
        }
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = Some(last_name);
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let mut db = self.inner.write().await;
        let pos = db.users.iter().position(|u| u.id == id);
        Ok(pos.map(|i| db.users.remove(i)))
    }

    async fn find_blogs(&self, filter: &BlogFilter) -> Result<Vec<Blog>, StoreError> {
        let matcher = BlogMatcher::new(filter)?;
        let db = self.inner.read().await;
        Ok(db
            .blogs
            .iter()
            .filter(|b| matcher.matches(b))
            .cloned()
            .collect())
    }

    async fn find_blog(&self, id: Uuid) -> Result<Option<Blog>, StoreError> {
        let db = self.inner.read().await;
        Ok(db.blogs.iter().find(|b| b.id == id).cloned())
    }

    async fn insert_blog(&self, blog: NewBlog) -> Result<Blog, StoreError> {
        let mut db = self.inner.write().await;
        let now = Utc::now();
        let blog = Blog {
            id: Uuid::new_v4(),
            title: blog.title,
            author: blog.author,
            content: blog.content,
            created_at: now,
            updated_at: now,
        };
        db.blogs.push(blog.clone());
        Ok(blog)
    }

    async fn update_blog(
        &self,
        id: Uuid,
        changes: BlogChanges,
    ) -> Result<Option<Blog>, StoreError> {
        let mut db = self.inner.write().await;
        let Some(blog) = db.blogs.iter_mut().find(|b| b.id == id) else {
            return Ok(None);
        };
        if changes.is_empty() {
            return Ok(Some(blog.clone()));
        }
        if let Some(title) = changes.title {
            blog.title = title;
        }
        if let Some(author) = changes.author {
            blog.author = author;
        }
        if let Some(content) = changes.content {
            blog.content = content;
        }
        blog.updated_at = Utc::now();
        Ok(Some(blog.clone()))
    }

    async fn delete_blog(&self, id: Uuid) -> Result<Option<Blog>, StoreError> {
        let mut db = self.inner.write().await;
        let pos = db.blogs.iter().position(|b| b.id == id);
        Ok(pos.map(|i| db.blogs.remove(i)))
    }

    async fn delete_blogs(&self, filter: &BlogFilter) -> Result<u64, StoreError> {
        let matcher = BlogMatcher::new(filter)?;
        let mut db = self.inner.write().await;
        let before = db.blogs.len();
        db.blogs.retain(|b| !matcher.matches(b));
        Ok((before - db.blogs.len()) as u64)
    }

    async fn find_comments(&self, filter: &CommentFilter) -> Result<Vec<Comment>, StoreError> {
        let db = self.inner.read().await;
        Ok(db
            .comments
            .iter()
            .filter(|c| comment_matches(filter, c))
            .cloned()
            .collect())
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<Comment, StoreError> {
        let mut db = self.inner.write().await;
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            blog: comment.blog,
            user: comment.user,
            content: comment.content,
            note: comment.note,
            created_at: now,
            updated_at: now,
        };
        db.comments.push(comment.clone());
        Ok(comment)
    }

    async fn delete_comments(&self, filter: &CommentFilter) -> Result<u64, StoreError> {
        let mut db = self.inner.write().await;
        let before = db.comments.len();
        db.comments.retain(|c| !comment_matches(filter, c));
        Ok((before - db.comments.len()) as u64)
    }

    async fn distinct_comment_blogs(
        &self,
        filter: &CommentFilter,
    ) -> Result<Vec<Uuid>, StoreError> {
        let db = self.inner.read().await;
        let mut blogs: Vec<Uuid> = Vec::new();
        for comment in db.comments.iter().filter(|c| comment_matches(filter, c)) {
            if !blogs.contains(&comment.blog) {
                blogs.push(comment.blog);
            }
        }
        Ok(blogs)
    }
}
