use serde::Deserialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::database::models::{NewPost, Post, PostChanges};
use crate::database::repository::Repository;
use crate::error::FieldErrors;
use crate::policy::{Actor, Visibility};

use super::{check_required, check_text, finish, Reference, Resource, ResourceKind, WriteMode};

pub const TITLE_MAX_CHARS: usize = 200;

pub struct Posts;

/// Writable post fields. `author` is deliberately not listed: it is
/// always the requester and never read from the body.
#[derive(Debug, Default, Deserialize)]
pub struct PostFields {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<i64>,
    pub published: Option<bool>,
}

impl Resource for Posts {
    const KIND: ResourceKind = ResourceKind::Post;

    type Record = Post;
    type Fields = PostFields;
    type Draft = NewPost;
    type Changes = PostChanges;

    fn repository(state: &AppState) -> Arc<dyn Repository<Self>> {
        state.posts.clone()
    }

    fn visibility(actor: &Actor) -> Visibility {
        Visibility::posts_for(actor)
    }

    fn id(record: &Post) -> i64 {
        record.id
    }

    fn owner(record: &Post) -> Option<i64> {
        Some(record.author)
    }

    fn display_label(record: &Post) -> String {
        record.title.clone()
    }

    fn references(fields: &PostFields) -> Vec<Reference> {
        fields
            .category
            .map(|id| Reference {
                field: "category",
                kind: ResourceKind::Category,
                id,
            })
            .into_iter()
            .collect()
    }

    fn record_references(record: &Post) -> Vec<Reference> {
        vec![Reference {
            field: "category",
            kind: ResourceKind::Category,
            id: record.category,
        }]
    }

    fn draft(fields: PostFields) -> Result<NewPost, FieldErrors> {
        let changes = Self::changes(fields, WriteMode::Full)?;
        match (changes.title, changes.content, changes.category) {
            (Some(title), Some(content), Some(category)) => Ok(NewPost {
                title,
                content,
                category,
                published: changes.published.unwrap_or(false),
            }),
            _ => Err(FieldErrors::new()),
        }
    }

    fn changes(fields: PostFields, mode: WriteMode) -> Result<PostChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = check_text(&mut errors, "title", fields.title, Some(TITLE_MAX_CHARS), mode);
        let content = check_text(&mut errors, "content", fields.content, None, mode);
        let category = check_required(&mut errors, "category", fields.category, mode);
        finish(
            errors,
            PostChanges {
                title,
                content,
                category,
                // Has a default, so never required
                published: fields.published,
            },
        )
    }
}
