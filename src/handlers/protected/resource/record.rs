use axum::extract::{rejection::PathRejection, Extension, Path, State};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::observer::Operation;
use crate::policy::{authorize, Action, Actor};
use crate::resources::{Resource, WriteMode};

use super::{audit, find_visible, validate};

/// Non-numeric ids cannot name any instance
fn record_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id).map_err(|_| ApiError::not_found())
}

/// GET /api/{resource}/{id}/
pub async fn retrieve<R: Resource>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<R::Record> {
    let id = record_id(path)?;
    let record = find_visible::<R>(&state, &actor, id).await?;
    authorize(&actor, Action::Read, R::owner(&record))?;

    tracing::debug!(resource = %R::KIND, id, actor = %actor.identity(), "retrieved");
    Ok(ApiResponse::success(record))
}

/// PUT /api/{resource}/{id}/ - every required field must be present
pub async fn put<R: Resource>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<JsonBody<R::Fields>, ApiError>,
) -> ApiResult<R::Record> {
    update::<R>(state, actor, path, body, WriteMode::Full).await
}

/// PATCH /api/{resource}/{id}/ - only the fields present are changed
pub async fn patch<R: Resource>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<JsonBody<R::Fields>, ApiError>,
) -> ApiResult<R::Record> {
    update::<R>(state, actor, path, body, WriteMode::Partial).await
}

async fn update<R: Resource>(
    state: AppState,
    actor: Actor,
    path: Result<Path<i64>, PathRejection>,
    body: Result<JsonBody<R::Fields>, ApiError>,
    mode: WriteMode,
) -> ApiResult<R::Record> {
    actor.require_authenticated()?;
    let id = record_id(path)?;
    let existing = find_visible::<R>(&state, &actor, id).await?;
    authorize(&actor, Action::Update, R::owner(&existing))?;
    let JsonBody(fields) = body?;

    let changes = validate::<R, _>(&state, &actor, Some(&existing), fields, |fields| {
        R::changes(fields, mode)
    })
    .await?;
    let record = R::repository(&state)
        .update(id, changes)
        .await?
        .ok_or_else(ApiError::not_found)?;

    audit::<R>(&state, Operation::Update, &record, &actor);
    Ok(ApiResponse::success(record))
}

/// DELETE /api/{resource}/{id}/
pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<()> {
    actor.require_authenticated()?;
    let id = record_id(path)?;
    let existing = find_visible::<R>(&state, &actor, id).await?;
    authorize(&actor, Action::Delete, R::owner(&existing))?;

    if !R::repository(&state).delete(id).await? {
        return Err(ApiError::not_found());
    }

    audit::<R>(&state, Operation::Delete, &existing, &actor);
    Ok(ApiResponse::no_content())
}
