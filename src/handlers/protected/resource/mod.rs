// Generic CRUD handlers shared by every resource type

use serde::Deserialize;

use crate::app::AppState;
use crate::error::{ApiError, FieldErrors};
use crate::observer::{AuditEvent, Operation};
use crate::policy::Actor;
use crate::resources::{Categories, Comments, Posts, Resource, ResourceKind};

pub mod collection;
pub mod record;

pub use collection::{create, list};
pub use record::{delete, patch, put, retrieve};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Fetch an instance through the requester's read filter
pub(crate) async fn find_visible<R: Resource>(
    state: &AppState,
    actor: &Actor,
    id: i64,
) -> Result<R::Record, ApiError> {
    R::repository(state)
        .get(id, &R::visibility(actor))
        .await?
        .ok_or_else(ApiError::not_found)
}

async fn is_visible<R: Resource>(state: &AppState, actor: &Actor, id: i64) -> Result<bool, ApiError> {
    Ok(R::repository(state).get(id, &R::visibility(actor)).await?.is_some())
}

/// Collect `Invalid pk` errors for references the requester cannot see.
///
/// References the instance already holds are kept as they are, even if the
/// target has since become hidden from the requester.
async fn missing_references<R: Resource>(
    state: &AppState,
    actor: &Actor,
    fields: &R::Fields,
    existing: Option<&R::Record>,
) -> Result<FieldErrors, ApiError> {
    let mut errors = FieldErrors::new();
    let current = existing.map(R::record_references).unwrap_or_default();

    for reference in R::references(fields) {
        if current.contains(&reference) {
            continue;
        }
        let found = match reference.kind {
            ResourceKind::Category => is_visible::<Categories>(state, actor, reference.id).await?,
            ResourceKind::Post => is_visible::<Posts>(state, actor, reference.id).await?,
            ResourceKind::Comment => is_visible::<Comments>(state, actor, reference.id).await?,
        };
        if !found {
            errors.insert(
                reference.field.to_string(),
                format!("Invalid pk \"{}\" - object does not exist.", reference.id),
            );
        }
    }

    Ok(errors)
}

/// Validate whitelisted fields and their references, reporting every
/// failing field at once. `existing` is the instance being updated.
pub(crate) async fn validate<R, T>(
    state: &AppState,
    actor: &Actor,
    existing: Option<&R::Record>,
    fields: R::Fields,
    build: impl FnOnce(R::Fields) -> Result<T, FieldErrors>,
) -> Result<T, ApiError>
where
    R: Resource,
{
    let mut errors = missing_references::<R>(state, actor, &fields, existing).await?;

    match build(fields) {
        Ok(value) if errors.is_empty() => Ok(value),
        Ok(_) => Err(ApiError::invalid_fields(errors)),
        Err(field_errors) => {
            for (field, message) in field_errors {
                errors.entry(field).or_insert(message);
            }
            Err(ApiError::invalid_fields(errors))
        }
    }
}

/// Hand a committed mutation to the observer pipeline
pub(crate) fn audit<R: Resource>(state: &AppState, operation: Operation, record: &R::Record, actor: &Actor) {
    state.observers.dispatch(AuditEvent::new(
        operation,
        R::KIND,
        R::id(record),
        actor,
        R::display_label(record),
    ));
}
