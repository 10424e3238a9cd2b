use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{AttrResponse, CreateAttrRequest, ListAttrParams},
    repo_types::AttrKind,
    services::{parse_flag, validate_name},
};
use crate::{auth::AuthUser, error::AppError, extract::ApiJson, state::AppState};

/// List and create routes for one attribute kind. The kind travels to the
/// shared handlers as a request extension.
pub fn router(kind: AttrKind) -> Router<AppState> {
    Router::new()
        .route(kind.path(), get(list_attrs).post(create_attr))
        .layer(Extension(kind))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_attrs(
    State(state): State<AppState>,
    Extension(kind): Extension<AttrKind>,
    AuthUser(user): AuthUser,
    Query(params): Query<ListAttrParams>,
) -> Result<Json<Vec<AttrResponse>>, AppError> {
    let assigned_only = parse_flag("assigned_only", params.assigned_only.as_deref())?;
    let rows = state.attrs.list(kind, user.id, assigned_only).await?;
    Ok(Json(rows.into_iter().map(AttrResponse::from).collect()))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_attr(
    State(state): State<AppState>,
    Extension(kind): Extension<AttrKind>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<CreateAttrRequest>,
) -> Result<(StatusCode, Json<AttrResponse>), AppError> {
    let name = validate_name(&payload.name)?;
    let row = state.attrs.create(kind, user.id, &name).await?;
    info!(%kind, id = row.id, "attribute created");
    Ok((StatusCode::CREATED, Json(row.into())))
}
