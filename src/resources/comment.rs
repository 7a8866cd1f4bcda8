use serde::Deserialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::database::models::{Comment, CommentChanges, NewComment};
use crate::database::repository::Repository;
use crate::error::FieldErrors;

use super::{check_required, check_text, finish, Reference, Resource, ResourceKind, WriteMode};

pub struct Comments;

#[derive(Debug, Default, Deserialize)]
pub struct CommentFields {
    pub post: Option<i64>,
    pub content: Option<String>,
}

impl Resource for Comments {
    const KIND: ResourceKind = ResourceKind::Comment;

    type Record = Comment;
    type Fields = CommentFields;
    type Draft = NewComment;
    type Changes = CommentChanges;

    fn repository(state: &AppState) -> Arc<dyn Repository<Self>> {
        state.comments.clone()
    }

    fn id(record: &Comment) -> i64 {
        record.id
    }

    fn owner(record: &Comment) -> Option<i64> {
        Some(record.author)
    }

    fn display_label(record: &Comment) -> String {
        record.id.to_string()
    }

    fn references(fields: &CommentFields) -> Vec<Reference> {
        fields
            .post
            .map(|id| Reference {
                field: "post",
                kind: ResourceKind::Post,
                id,
            })
            .into_iter()
            .collect()
    }

    fn record_references(record: &Comment) -> Vec<Reference> {
        vec![Reference {
            field: "post",
            kind: ResourceKind::Post,
            id: record.post,
        }]
    }

    fn draft(fields: CommentFields) -> Result<NewComment, FieldErrors> {
        let changes = Self::changes(fields, WriteMode::Full)?;
        match (changes.post, changes.content) {
            (Some(post), Some(content)) => Ok(NewComment { post, content }),
            _ => Err(FieldErrors::new()),
        }
    }

    fn changes(fields: CommentFields, mode: WriteMode) -> Result<CommentChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let post = check_required(&mut errors, "post", fields.post, mode);
        let content = check_text(&mut errors, "content", fields.content, None, mode);
        finish(errors, CommentChanges { post, content })
    }
}
