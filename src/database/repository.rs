use async_trait::async_trait;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, User};
use crate::policy::Visibility;
use crate::resources::Resource;

/// Window over an ordered collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Page {
    pub limit: Option<i64>,
    pub offset: i64,
}

impl Page {
    /// Page from client query parameters. Only a client-supplied limit is
    /// applied, capped at `max_limit`; without one the whole set is returned.
    pub fn from_query(limit: Option<i64>, offset: Option<i64>, max_limit: i64) -> Self {
        Self {
            limit: limit.map(|limit| limit.min(max_limit).max(0)),
            offset: offset.unwrap_or(0).max(0),
        }
    }

    /// Apply the window to rows already in their final order
    pub fn slice<T>(&self, rows: impl IntoIterator<Item = T>) -> Vec<T> {
        let rows = rows.into_iter().skip(self.offset as usize);
        match self.limit {
            Some(limit) => rows.take(limit as usize).collect(),
            None => rows.collect(),
        }
    }
}

/// Storage contract for one resource type.
///
/// Collections are ordered newest first by creation time, ties broken by
/// descending id. `visibility` must be applied inside the same query as
/// ordering and paging.
#[async_trait]
pub trait Repository<R: Resource>: Send + Sync {
    async fn list(&self, visibility: &Visibility, page: Page) -> Result<Vec<R::Record>, DatabaseError>;

    async fn get(&self, id: i64, visibility: &Visibility) -> Result<Option<R::Record>, DatabaseError>;

    /// Insert with `author_id` as owner; unowned resources ignore it
    async fn insert(&self, author_id: i64, draft: R::Draft) -> Result<R::Record, DatabaseError>;

    /// Returns `None` when the row no longer exists
    async fn update(&self, id: i64, changes: R::Changes) -> Result<Option<R::Record>, DatabaseError>;

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError>;

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError>;

    /// Returns `None` for an unknown username
    async fn set_user_active(&self, username: &str, active: bool) -> Result<Option<User>, DatabaseError>;
}

/// Whole-store operations used by health checks and seeding
#[async_trait]
pub trait Maintenance: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;

    /// Remove all comments, posts, categories and users, sparing
    /// superusers when `keep_superusers` is set
    async fn clear_content(&self, keep_superusers: bool) -> Result<(), DatabaseError>;
}
