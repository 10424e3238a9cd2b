use axum::{
    extract::{Query, State},
    http::{header, HeaderName, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{RecipeDetailResponse, RecipeListParams, RecipeRequest, RecipeResponse},
    services::{apply_patch, draft_from_request, filter_from_params},
};
use crate::{
    auth::AuthUser,
    error::AppError,
    extract::{ApiJson, ApiPath},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/:id",
            get(get_recipe)
                .put(update_recipe)
                .patch(partial_update_recipe)
                .delete(delete_recipe),
        )
}

fn recipe_not_found() -> AppError {
    AppError::not_found("Recipe not found")
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<RecipeListParams>,
) -> Result<Json<Vec<RecipeResponse>>, AppError> {
    let filter = filter_from_params(&params)?;
    let rows = state.recipes.list(user.id, &filter).await?;
    Ok(Json(rows.into_iter().map(RecipeResponse::from).collect()))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<RecipeDetailResponse>, AppError> {
    let detail = state
        .recipes
        .get(user.id, id)
        .await?
        .ok_or_else(recipe_not_found)?;
    Ok(Json(detail.into()))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<RecipeRequest>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<RecipeResponse>), AppError> {
    let draft = draft_from_request(payload)?;
    let created = state.recipes.create(user.id, &draft).await?;
    let id = created.recipe.id;
    info!(recipe_id = id, "recipe created");
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/v1/recipes/{id}"))],
        Json(created.into()),
    ))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<RecipeRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    let draft = draft_from_request(payload)?;
    let updated = state
        .recipes
        .update(user.id, id, &draft)
        .await?
        .ok_or_else(recipe_not_found)?;
    Ok(Json(updated.into()))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn partial_update_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<RecipeRequest>,
) -> Result<Json<RecipeResponse>, AppError> {
    let current = state
        .recipes
        .get(user.id, id)
        .await?
        .ok_or_else(recipe_not_found)?;
    let draft = apply_patch(&current, payload)?;
    let updated = state
        .recipes
        .update(user.id, id, &draft)
        .await?
        .ok_or_else(recipe_not_found)?;
    Ok(Json(updated.into()))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, AppError> {
    if !state.recipes.delete(user.id, id).await? {
        return Err(recipe_not_found());
    }
    info!(recipe_id = id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}
