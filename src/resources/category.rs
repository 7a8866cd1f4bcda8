use serde::Deserialize;
use std::sync::Arc;

use crate::app::AppState;
use crate::database::models::{Category, CategoryChanges, NewCategory};
use crate::database::repository::Repository;
use crate::error::FieldErrors;

use super::{check_text, finish, Reference, Resource, ResourceKind, WriteMode};

pub const NAME_MAX_CHARS: usize = 100;

pub struct Categories;

#[derive(Debug, Default, Deserialize)]
pub struct CategoryFields {
    pub name: Option<String>,
}

impl Resource for Categories {
    const KIND: ResourceKind = ResourceKind::Category;

    type Record = Category;
    type Fields = CategoryFields;
    type Draft = NewCategory;
    type Changes = CategoryChanges;

    fn repository(state: &AppState) -> Arc<dyn Repository<Self>> {
        state.categories.clone()
    }

    fn id(record: &Category) -> i64 {
        record.id
    }

    fn owner(_record: &Category) -> Option<i64> {
        None
    }

    fn display_label(record: &Category) -> String {
        record.name.clone()
    }

    fn references(_fields: &CategoryFields) -> Vec<Reference> {
        Vec::new()
    }

    fn draft(fields: CategoryFields) -> Result<NewCategory, FieldErrors> {
        let changes = Self::changes(fields, WriteMode::Full)?;
        match changes.name {
            Some(name) => Ok(NewCategory { name }),
            None => Err(FieldErrors::new()),
        }
    }

    fn changes(fields: CategoryFields, mode: WriteMode) -> Result<CategoryChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = check_text(&mut errors, "name", fields.name, Some(NAME_MAX_CHARS), mode);
        finish(errors, CategoryChanges { name })
    }
}
