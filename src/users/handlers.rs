use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreateUserRequest, PublicUser, RefreshRequest, TokenRequest, TokenResponse, UpdateMeRequest},
    repo_types::{NewUser, User},
    services,
};
use crate::{
    auth::{AuthUser, JwtKeys},
    error::AppError,
    extract::ApiJson,
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/users/create", post(create_user))
        .route("/users/token", post(token))
        .route("/users/token/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/users/me", get(get_me).patch(update_me).delete(delete_me))
}

fn issue_tokens(state: &AppState, user: User) -> Result<TokenResponse, AppError> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(TokenResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let new = NewUser::new(payload.full_name, payload.email, payload.password);
    let user = services::create_user(state.users.as_ref(), new).await?;
    info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn token(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let user = services::authenticate(state.users.as_ref(), &payload.email, &payload.password).await?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RefreshRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::unauthorized(e.to_string()))?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .filter(|u| u.active)
        .ok_or_else(|| AppError::unauthorized("User not found"))?;
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user.into())
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<UpdateMeRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let user = services::update_profile(
        state.users.as_ref(),
        user.id,
        payload.full_name.as_deref(),
        payload.password.as_deref(),
    )
    .await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<StatusCode, AppError> {
    if !state.users.delete(user.id).await? {
        return Err(AppError::not_found("User not found"));
    }
    info!(user_id = %user.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
