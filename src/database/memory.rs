use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Category, CategoryChanges, Comment, CommentChanges, NewCategory, NewComment, NewPost, NewUser, Post,
    PostChanges, User,
};
use crate::database::repository::{Maintenance, Page, Repository, UserStore};
use crate::policy::Visibility;
use crate::resources::{Categories, Comments, Posts};

/// Process-local entity store.
///
/// Enforces the same constraints as the Postgres schema: unique category
/// names and usernames, existing foreign keys, and cascading deletes.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    categories: BTreeMap<i64, Category>,
    posts: BTreeMap<i64, PostRow>,
    comments: BTreeMap<i64, CommentRow>,
    last_id: i64,
}

#[derive(Clone)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    category_id: i64,
    author_id: i64,
    published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: i64,
    content: String,
    created_at: DateTime<Utc>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn username(&self, id: i64) -> String {
        self.users.get(&id).map(|u| u.username.clone()).unwrap_or_default()
    }

    fn post(&self, row: &PostRow) -> Post {
        Post {
            id: row.id,
            title: row.title.clone(),
            content: row.content.clone(),
            category: row.category_id,
            category_name: self
                .categories
                .get(&row.category_id)
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            author: row.author_id,
            author_username: self.username(row.author_id),
            published: row.published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }

    fn comment(&self, row: &CommentRow) -> Comment {
        Comment {
            id: row.id,
            post: row.post_id,
            post_title: self
                .posts
                .get(&row.post_id)
                .map(|p| p.title.clone())
                .unwrap_or_default(),
            author: row.author_id,
            author_username: self.username(row.author_id),
            content: row.content.clone(),
            created_at: row.created_at,
        }
    }

    fn check_category_name(&self, name: &str, except: Option<i64>) -> Result<(), DatabaseError> {
        let taken = self
            .categories
            .values()
            .any(|c| c.name == name && Some(c.id) != except);
        if taken {
            return Err(DatabaseError::Conflict { field: "name" });
        }
        Ok(())
    }

    fn check_exists<T>(table: &BTreeMap<i64, T>, field: &'static str, id: i64) -> Result<(), DatabaseError> {
        if table.contains_key(&id) {
            Ok(())
        } else {
            Err(DatabaseError::InvalidReference { field, id })
        }
    }

    fn remove_post(&mut self, id: i64) -> bool {
        let removed = self.posts.remove(&id).is_some();
        if removed {
            self.comments.retain(|_, c| c.post_id != id);
        }
        removed
    }
}

fn admits(visibility: &Visibility, row: &PostRow) -> bool {
    visibility.admits_post(row.published, row.author_id)
}

/// Sort newest first with id as tie breaker, then apply the page
fn newest_first<T>(mut rows: Vec<T>, key: impl Fn(&T) -> (DateTime<Utc>, i64), page: Page) -> Vec<T> {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
    page.slice(rows)
}

#[async_trait]
impl Repository<Categories> for MemoryStore {
    async fn list(&self, _visibility: &Visibility, page: Page) -> Result<Vec<Category>, DatabaseError> {
        let tables = self.tables.read().await;
        let rows: Vec<Category> = tables.categories.values().cloned().collect();
        Ok(newest_first(rows, |c: &Category| (c.created_at, c.id), page))
    }

    async fn get(&self, id: i64, _visibility: &Visibility) -> Result<Option<Category>, DatabaseError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn insert(&self, _author_id: i64, draft: NewCategory) -> Result<Category, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_category_name(&draft.name, None)?;
        let category = Category {
            id: tables.next_id(),
            name: draft.name,
            created_at: Utc::now(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(&self, id: i64, changes: CategoryChanges) -> Result<Option<Category>, DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(name) = &changes.name {
            tables.check_category_name(name, Some(id))?;
        }
        let Some(category) = tables.categories.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            category.name = name;
        }
        Ok(Some(category.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.categories.remove(&id).is_none() {
            return Ok(false);
        }
        let orphaned: Vec<i64> = tables
            .posts
            .values()
            .filter(|p| p.category_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in orphaned {
            tables.remove_post(post_id);
        }
        Ok(true)
    }
}

#[async_trait]
impl Repository<Posts> for MemoryStore {
    async fn list(&self, visibility: &Visibility, page: Page) -> Result<Vec<Post>, DatabaseError> {
        let tables = self.tables.read().await;
        let rows: Vec<Post> = tables
            .posts
            .values()
            .filter(|row| admits(visibility, row))
            .map(|row| tables.post(row))
            .collect();
        Ok(newest_first(rows, |p: &Post| (p.created_at, p.id), page))
    }

    async fn get(&self, id: i64, visibility: &Visibility) -> Result<Option<Post>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .get(&id)
            .filter(|row| admits(visibility, row))
            .map(|row| tables.post(row)))
    }

    async fn insert(&self, author_id: i64, draft: NewPost) -> Result<Post, DatabaseError> {
        let mut tables = self.tables.write().await;
        Tables::check_exists(&tables.categories, "category", draft.category)?;
        Tables::check_exists(&tables.users, "author", author_id)?;
        let now = Utc::now();
        let row = PostRow {
            id: tables.next_id(),
            title: draft.title,
            content: draft.content,
            category_id: draft.category,
            author_id,
            published: draft.published,
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(row.id, row.clone());
        Ok(tables.post(&row))
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Option<Post>, DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(category) = changes.category {
            Tables::check_exists(&tables.categories, "category", category)?;
        }
        let Some(row) = tables.posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            row.title = title;
        }
        if let Some(content) = changes.content {
            row.content = content;
        }
        if let Some(category) = changes.category {
            row.category_id = category;
        }
        if let Some(published) = changes.published {
            row.published = published;
        }
        row.updated_at = Utc::now();
        let row = row.clone();
        Ok(Some(tables.post(&row)))
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.tables.write().await.remove_post(id))
    }
}

#[async_trait]
impl Repository<Comments> for MemoryStore {
    async fn list(&self, _visibility: &Visibility, page: Page) -> Result<Vec<Comment>, DatabaseError> {
        let tables = self.tables.read().await;
        let rows: Vec<Comment> = tables.comments.values().map(|row| tables.comment(row)).collect();
        Ok(newest_first(rows, |c: &Comment| (c.created_at, c.id), page))
    }

    async fn get(&self, id: i64, _visibility: &Visibility) -> Result<Option<Comment>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.comments.get(&id).map(|row| tables.comment(row)))
    }

    async fn insert(&self, author_id: i64, draft: NewComment) -> Result<Comment, DatabaseError> {
        let mut tables = self.tables.write().await;
        Tables::check_exists(&tables.posts, "post", draft.post)?;
        Tables::check_exists(&tables.users, "author", author_id)?;
        let row = CommentRow {
            id: tables.next_id(),
            post_id: draft.post,
            author_id,
            content: draft.content,
            created_at: Utc::now(),
        };
        tables.comments.insert(row.id, row.clone());
        Ok(tables.comment(&row))
    }

    async fn update(&self, id: i64, changes: CommentChanges) -> Result<Option<Comment>, DatabaseError> {
        let mut tables = self.tables.write().await;
        if let Some(post) = changes.post {
            Tables::check_exists(&tables.posts, "post", post)?;
        }
        let Some(row) = tables.comments.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(post) = changes.post {
            row.post_id = post;
        }
        if let Some(content) = changes.content {
            row.content = content;
        }
        let row = row.clone();
        Ok(Some(tables.comment(&row)))
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.tables.write().await.comments.remove(&id).is_some())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(DatabaseError::Conflict { field: "username" });
        }
        let user = User {
            id: tables.next_id(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_active: true,
            is_superuser: user.is_superuser,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_user_active(&self, username: &str, active: bool) -> Result<Option<User>, DatabaseError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.values_mut().find(|u| u.username == username).map(|user| {
            user.is_active = active;
            user.clone()
        }))
    }
}

#[async_trait]
impl Maintenance for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn clear_content(&self, keep_superusers: bool) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.comments.clear();
        tables.posts.clear();
        tables.categories.clear();
        if keep_superusers {
            tables.users.retain(|_, u| u.is_superuser);
        } else {
            tables.users.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn author(store: &MemoryStore, name: &str) -> User {
        store
            .create_user(NewUser {
                username: name.to_string(),
                email: format!("{}@example.com", name),
                password_hash: "!".to_string(),
                is_superuser: false,
            })
            .await
            .unwrap()
    }

    async fn category(store: &MemoryStore, name: &str) -> Category {
        Repository::<Categories>::insert(store, 0, NewCategory { name: name.to_string() })
            .await
            .unwrap()
    }

    async fn post(store: &MemoryStore, author: i64, category: i64, title: &str, published: bool) -> Post {
        Repository::<Posts>::insert(
            store,
            author,
            NewPost {
                title: title.to_string(),
                content: "body".to_string(),
                category,
                published,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_category_name_conflicts() {
        let store = MemoryStore::new();
        let tech = category(&store, "Tech").await;
        let err = Repository::<Categories>::insert(&store, 0, NewCategory { name: "Tech".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict { field: "name" }));

        // Renaming to its own name is not a conflict
        let same = Repository::<Categories>::update(
            &store,
            tech.id,
            CategoryChanges {
                name: Some("Tech".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(same.unwrap().name, "Tech");
    }

    #[tokio::test]
    async fn post_insert_resolves_display_fields() {
        let store = MemoryStore::new();
        let alice = author(&store, "alice").await;
        let tech = category(&store, "Tech").await;
        let p = post(&store, alice.id, tech.id, "Hello", false).await;
        assert_eq!(p.category_name, "Tech");
        assert_eq!(p.author_username, "alice");
        assert!(!p.published);
    }

    #[tokio::test]
    async fn post_insert_requires_existing_category() {
        let store = MemoryStore::new();
        let alice = author(&store, "alice").await;
        let err = Repository::<Posts>::insert(
            &store,
            alice.id,
            NewPost {
                title: "T".into(),
                content: "C".into(),
                category: 999,
                published: true,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::InvalidReference {
                field: "category",
                id: 999
            }
        ));
    }

    #[tokio::test]
    async fn visibility_filters_list_and_get() {
        let store = MemoryStore::new();
        let alice = author(&store, "alice").await;
        let bob = author(&store, "bob").await;
        let tech = category(&store, "Tech").await;
        let public = post(&store, alice.id, tech.id, "public", true).await;
        let draft = post(&store, alice.id, tech.id, "draft", false).await;

        let anonymous = Repository::<Posts>::list(&store, &Visibility::Published, Page::default())
            .await
            .unwrap();
        assert_eq!(anonymous.iter().map(|p| p.id).collect::<Vec<_>>(), vec![public.id]);

        let owner = Repository::<Posts>::list(&store, &Visibility::PublishedOrAuthoredBy(alice.id), Page::default())
            .await
            .unwrap();
        assert_eq!(owner.iter().map(|p| p.id).collect::<Vec<_>>(), vec![draft.id, public.id]);

        let other = Repository::<Posts>::get(&store, draft.id, &Visibility::PublishedOrAuthoredBy(bob.id))
            .await
            .unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn deleting_category_cascades() {
        let store = MemoryStore::new();
        let alice = author(&store, "alice").await;
        let tech = category(&store, "Tech").await;
        let p = post(&store, alice.id, tech.id, "Hello", true).await;
        Repository::<Comments>::insert(
            &store,
            alice.id,
            NewComment {
                post: p.id,
                content: "first".into(),
            },
        )
        .await
        .unwrap();

        assert!(Repository::<Categories>::delete(&store, tech.id).await.unwrap());
        let posts = Repository::<Posts>::list(&store, &Visibility::Everything, Page::default())
            .await
            .unwrap();
        let comments = Repository::<Comments>::list(&store, &Visibility::Everything, Page::default())
            .await
            .unwrap();
        assert!(posts.is_empty());
        assert!(comments.is_empty());
        assert!(!Repository::<Categories>::delete(&store, tech.id).await.unwrap());
    }

    #[tokio::test]
    async fn clear_content_keeps_superusers() {
        let store = MemoryStore::new();
        author(&store, "alice").await;
        let admin = store
            .create_user(NewUser {
                username: "admin".into(),
                email: String::new(),
                password_hash: "!".into(),
                is_superuser: true,
            })
            .await
            .unwrap();
        store.clear_content(true).await.unwrap();
        assert!(store.find_user_by_username("alice").await.unwrap().is_none());
        assert_eq!(store.find_user_by_id(admin.id).await.unwrap().unwrap().username, "admin");
    }

    #[tokio::test]
    async fn users_can_be_deactivated() {
        let store = MemoryStore::new();
        let alice = author(&store, "alice").await;
        assert!(alice.is_active);

        let updated = store.set_user_active("alice", false).await.unwrap().unwrap();
        assert!(!updated.is_active);
        assert!(!store.find_user_by_id(alice.id).await.unwrap().unwrap().is_active);
        assert!(store.set_user_active("nobody", false).await.unwrap().is_none());
    }
}
