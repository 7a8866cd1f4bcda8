//! Per-entity descriptions consumed by the generic handlers.
//!
//! Each resource names its record type, its inbound field whitelist, how
//! whitelisted fields become validated drafts/changes, and which policy
//! hooks (visibility, owner) apply.

use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::app::AppState;
use crate::database::repository::Repository;
use crate::error::FieldErrors;
use crate::policy::{Actor, Visibility};

pub mod category;
pub mod comment;
pub mod post;

pub use category::Categories;
pub use comment::Comments;
pub use post::Posts;

pub(crate) const REQUIRED: &str = "This field is required.";
pub(crate) const BLANK: &str = "This field may not be blank.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Category,
    Post,
    Comment,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Category => "category",
            ResourceKind::Post => "post",
            ResourceKind::Comment => "comment",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PUT validates every required field; PATCH only what is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Full,
    Partial,
}

/// Foreign key carried by an inbound payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub field: &'static str,
    pub kind: ResourceKind,
    pub id: i64,
}

pub trait Resource: Send + Sync + Sized + 'static {
    const KIND: ResourceKind;

    /// Outbound representation
    type Record: Serialize + Clone + Send + Sync + 'static;
    /// Inbound whitelist. Server-assigned fields are absent from it.
    type Fields: DeserializeOwned + Send + Sync + 'static;
    type Draft: Send + 'static;
    type Changes: Send + 'static;

    fn repository(state: &AppState) -> Arc<dyn Repository<Self>>;

    fn visibility(_actor: &Actor) -> Visibility {
        Visibility::Everything
    }

    fn id(record: &Self::Record) -> i64;

    /// Author of the instance; `None` for unowned resources
    fn owner(record: &Self::Record) -> Option<i64>;

    /// Human-readable label used in audit records
    fn display_label(record: &Self::Record) -> String;

    fn references(fields: &Self::Fields) -> Vec<Reference>;

    /// References already held by a stored instance. An update that keeps
    /// one of these is not re-checked against the requester's visibility.
    fn record_references(_record: &Self::Record) -> Vec<Reference> {
        Vec::new()
    }

    fn draft(fields: Self::Fields) -> Result<Self::Draft, FieldErrors>;

    fn changes(fields: Self::Fields, mode: WriteMode) -> Result<Self::Changes, FieldErrors>;
}

/// Validate an optional text field, trimming surrounding whitespace.
///
/// Returns `None` either when the field is absent in partial mode or when an
/// error was recorded for it.
pub(crate) fn check_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max_chars: Option<usize>,
    mode: WriteMode,
) -> Option<String> {
    let value = match value {
        Some(v) => v.trim().to_string(),
        None => {
            if mode == WriteMode::Full {
                errors.insert(field.to_string(), REQUIRED.to_string());
            }
            return None;
        }
    };

    if value.is_empty() {
        errors.insert(field.to_string(), BLANK.to_string());
        return None;
    }

    if let Some(max) = max_chars {
        if value.chars().count() > max {
            errors.insert(
                field.to_string(),
                format!("Ensure this field has no more than {} characters.", max),
            );
            return None;
        }
    }

    Some(value)
}

pub(crate) fn check_required<T>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<T>,
    mode: WriteMode,
) -> Option<T> {
    if value.is_none() && mode == WriteMode::Full {
        errors.insert(field.to_string(), REQUIRED.to_string());
    }
    value
}

pub(crate) fn finish<T>(errors: FieldErrors, value: T) -> Result<T, FieldErrors> {
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared_across_tasks<T: Send + Sync>() {}

    #[test]
    fn whitelists_can_be_held_across_awaits() {
        shared_across_tasks::<<Categories as Resource>::Fields>();
        shared_across_tasks::<<Posts as Resource>::Fields>();
        shared_across_tasks::<<Comments as Resource>::Fields>();
    }

    #[test]
    fn text_is_trimmed_and_checked() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            check_text(&mut errors, "name", Some("  Tech ".into()), Some(10), WriteMode::Full),
            Some("Tech".to_string())
        );
        assert!(errors.is_empty());

        assert_eq!(check_text(&mut errors, "name", Some("   ".into()), None, WriteMode::Full), None);
        assert_eq!(errors["name"], BLANK);

        let mut errors = FieldErrors::new();
        assert_eq!(
            check_text(&mut errors, "name", Some("abcdef".into()), Some(5), WriteMode::Partial),
            None
        );
        assert_eq!(errors["name"], "Ensure this field has no more than 5 characters.");
    }

    #[test]
    fn missing_fields_only_required_in_full_mode() {
        let mut errors = FieldErrors::new();
        assert_eq!(check_text(&mut errors, "title", None, None, WriteMode::Partial), None);
        assert!(check_required::<i64>(&mut errors, "category", None, WriteMode::Partial).is_none());
        assert!(errors.is_empty());

        check_text(&mut errors, "title", None, None, WriteMode::Full);
        check_required::<i64>(&mut errors, "category", None, WriteMode::Full);
        assert_eq!(errors["title"], REQUIRED);
        assert_eq!(errors["category"], REQUIRED);
    }
}
