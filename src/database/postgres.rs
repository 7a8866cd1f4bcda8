use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{
    Category, CategoryChanges, Comment, CommentChanges, NewCategory, NewComment, NewPost, NewUser, Post,
    PostChanges, User,
};
use crate::database::query_builder::{push_order_and_page, push_post_visibility};
use crate::database::repository::{Maintenance, Page, Repository, UserStore};
use crate::policy::Visibility;
use crate::resources::{Categories, Comments, Posts};

const CATEGORY_COLUMNS: &str = "c.id, c.name, c.created_at";

const POST_COLUMNS: &str = "p.id, p.title, p.content, p.category_id AS category, c.name AS category_name, \
     p.author_id AS author, u.username AS author_username, p.published, p.created_at, p.updated_at";
const POST_JOINS: &str = "JOIN categories c ON c.id = p.category_id JOIN users u ON u.id = p.author_id";

const COMMENT_COLUMNS: &str = "m.id, m.post_id AS post, p.title AS post_title, m.author_id AS author, \
     u.username AS author_username, m.content, m.created_at";
const COMMENT_JOINS: &str = "JOIN posts p ON p.id = m.post_id JOIN users u ON u.id = m.author_id";

const USER_COLUMNS: &str = "id, username, email, password_hash, is_active, is_superuser, created_at";

/// Named unique constraints and the field they guard
const UNIQUE_CONSTRAINTS: &[(&str, &str)] = &[
    ("categories_name_key", "name"),
    ("users_username_key", "username"),
];

/// Entity store over a Postgres pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map constraint violations onto domain errors.
///
/// `references` lists `(field, constraint, id)` for the foreign keys the
/// statement could have violated.
fn classify(err: sqlx::Error, references: &[(&'static str, &str, i64)]) -> DatabaseError {
    if let sqlx::Error::Database(db) = &err {
        if let Some(constraint) = db.constraint() {
            if let Some((_, field)) = UNIQUE_CONSTRAINTS.iter().find(|(name, _)| *name == constraint) {
                return DatabaseError::Conflict { field: *field };
            }
            if let Some((field, _, id)) = references.iter().find(|(_, name, _)| *name == constraint) {
                return DatabaseError::InvalidReference { field: *field, id: *id };
            }
        }
    }
    DatabaseError::Sqlx(err)
}

#[async_trait]
impl Repository<Categories> for PgStore {
    async fn list(&self, _visibility: &Visibility, page: Page) -> Result<Vec<Category>, DatabaseError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM categories c", CATEGORY_COLUMNS));
        push_order_and_page(&mut qb, "c", page);
        Ok(qb.build_query_as::<Category>().fetch_all(&self.pool).await?)
    }

    async fn get(&self, id: i64, _visibility: &Visibility) -> Result<Option<Category>, DatabaseError> {
        let sql = format!("SELECT {} FROM categories c WHERE c.id = $1", CATEGORY_COLUMNS);
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, _author_id: i64, draft: NewCategory) -> Result<Category, DatabaseError> {
        let sql = format!(
            "INSERT INTO categories AS c (name) VALUES ($1) RETURNING {}",
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(draft.name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, &[]))
    }

    async fn update(&self, id: i64, changes: CategoryChanges) -> Result<Option<Category>, DatabaseError> {
        let Some(name) = changes.name else {
            return <Self as Repository<Categories>>::get(self, id, &Visibility::Everything).await;
        };
        let sql = format!(
            "UPDATE categories AS c SET name = $2 WHERE c.id = $1 RETURNING {}",
            CATEGORY_COLUMNS
        );
        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify(e, &[]))
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Repository<Posts> for PgStore {
    async fn list(&self, visibility: &Visibility, page: Page) -> Result<Vec<Post>, DatabaseError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM posts p {} WHERE ",
            POST_COLUMNS, POST_JOINS
        ));
        push_post_visibility(&mut qb, visibility);
        push_order_and_page(&mut qb, "p", page);
        debug!("post list query: {}", qb.sql());
        Ok(qb.build_query_as::<Post>().fetch_all(&self.pool).await?)
    }

    async fn get(&self, id: i64, visibility: &Visibility) -> Result<Option<Post>, DatabaseError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM posts p {} WHERE p.id = ",
            POST_COLUMNS, POST_JOINS
        ));
        qb.push_bind(id);
        qb.push(" AND ");
        push_post_visibility(&mut qb, visibility);
        Ok(qb.build_query_as::<Post>().fetch_optional(&self.pool).await?)
    }

    async fn insert(&self, author_id: i64, draft: NewPost) -> Result<Post, DatabaseError> {
        let sql = format!(
            "WITH p AS (INSERT INTO posts (title, content, category_id, author_id, published) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *) SELECT {} FROM p {}",
            POST_COLUMNS, POST_JOINS
        );
        let category = draft.category;
        sqlx::query_as::<_, Post>(&sql)
            .bind(draft.title)
            .bind(draft.content)
            .bind(category)
            .bind(author_id)
            .bind(draft.published)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                classify(
                    e,
                    &[
                        ("category", "posts_category_id_fkey", category),
                        ("author", "posts_author_id_fkey", author_id),
                    ],
                )
            })
    }

    async fn update(&self, id: i64, changes: PostChanges) -> Result<Option<Post>, DatabaseError> {
        let mut qb = QueryBuilder::<Postgres>::new("WITH p AS (UPDATE posts SET updated_at = now()");
        if let Some(title) = changes.title {
            qb.push(", title = ");
            qb.push_bind(title);
        }
        if let Some(content) = changes.content {
            qb.push(", content = ");
            qb.push_bind(content);
        }
        if let Some(category) = changes.category {
            qb.push(", category_id = ");
            qb.push_bind(category);
        }
        if let Some(published) = changes.published {
            qb.push(", published = ");
            qb.push_bind(published);
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(format!(" RETURNING *) SELECT {} FROM p {}", POST_COLUMNS, POST_JOINS));

        let category = changes.category.unwrap_or_default();
        qb.build_query_as::<Post>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify(e, &[("category", "posts_category_id_fkey", category)]))
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Repository<Comments> for PgStore {
    async fn list(&self, _visibility: &Visibility, page: Page) -> Result<Vec<Comment>, DatabaseError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM comments m {}",
            COMMENT_COLUMNS, COMMENT_JOINS
        ));
        push_order_and_page(&mut qb, "m", page);
        Ok(qb.build_query_as::<Comment>().fetch_all(&self.pool).await?)
    }

    async fn get(&self, id: i64, _visibility: &Visibility) -> Result<Option<Comment>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM comments m {} WHERE m.id = $1",
            COMMENT_COLUMNS, COMMENT_JOINS
        );
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, author_id: i64, draft: NewComment) -> Result<Comment, DatabaseError> {
        let sql = format!(
            "WITH m AS (INSERT INTO comments (post_id, author_id, content) \
             VALUES ($1, $2, $3) RETURNING *) SELECT {} FROM m {}",
            COMMENT_COLUMNS, COMMENT_JOINS
        );
        let post = draft.post;
        sqlx::query_as::<_, Comment>(&sql)
            .bind(post)
            .bind(author_id)
            .bind(draft.content)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                classify(
                    e,
                    &[
                        ("post", "comments_post_id_fkey", post),
                        ("author", "comments_author_id_fkey", author_id),
                    ],
                )
            })
    }

    async fn update(&self, id: i64, changes: CommentChanges) -> Result<Option<Comment>, DatabaseError> {
        let mut qb = QueryBuilder::<Postgres>::new("WITH m AS (UPDATE comments SET id = id");
        if let Some(post) = changes.post {
            qb.push(", post_id = ");
            qb.push_bind(post);
        }
        if let Some(content) = changes.content {
            qb.push(", content = ");
            qb.push_bind(content);
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(format!(" RETURNING *) SELECT {} FROM m {}", COMMENT_COLUMNS, COMMENT_JOINS));

        let post = changes.post.unwrap_or_default();
        qb.build_query_as::<Comment>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| classify(e, &[("post", "comments_post_id_fkey", post)]))
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, is_superuser) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.username)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.is_superuser)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, &[]))
    }

    async fn set_user_active(&self, username: &str, active: bool) -> Result<Option<User>, DatabaseError> {
        let sql = format!(
            "UPDATE users SET is_active = $2 WHERE username = $1 RETURNING {}",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(active)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[async_trait]
impl Maintenance for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn clear_content(&self, keep_superusers: bool) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM comments").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM posts").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM categories").execute(&mut *tx).await?;
        let users = if keep_superusers {
            "DELETE FROM users WHERE NOT is_superuser"
        } else {
            "DELETE FROM users"
        };
        sqlx::query(users).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}
