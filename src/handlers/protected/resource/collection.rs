use axum::extract::{rejection::QueryRejection, Extension, Query, State};

use crate::app::AppState;
use crate::database::Page;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::observer::Operation;
use crate::policy::{authorize, Action, Actor};
use crate::resources::Resource;

use super::{audit, validate, PageQuery};

/// GET /api/{resource}/ - newest first, filtered by the requester's visibility
pub async fn list<R: Resource>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Vec<R::Record>> {
    let Query(params) = query?;
    let page = Page::from_query(params.limit, params.offset, state.config.api.max_page_size);

    let records = R::repository(&state).list(&R::visibility(&actor), page).await?;

    tracing::debug!(
        resource = %R::KIND,
        actor = %actor.identity(),
        count = records.len(),
        "listed"
    );
    Ok(ApiResponse::success(records))
}

/// POST /api/{resource}/ - the requester becomes the author
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    body: Result<JsonBody<R::Fields>, ApiError>,
) -> ApiResult<R::Record> {
    authorize(&actor, Action::Create, None)?;
    let author_id = actor.require_authenticated()?.user_id;
    let JsonBody(fields) = body?;

    let draft = validate::<R, _>(&state, &actor, None, fields, R::draft).await?;
    let record = R::repository(&state).insert(author_id, draft).await?;

    audit::<R>(&state, Operation::Create, &record, &actor);
    Ok(ApiResponse::created(record))
}
