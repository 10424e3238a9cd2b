use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::claims::{JwtKeys, TokenKind};
use crate::{error::AppError, state::AppState, users::repo_types::User};

/// Resolves the bearer token to an active user.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("missing Authorization header"))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| AppError::unauthorized("invalid auth scheme"))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            AppError::unauthorized("invalid or expired token")
        })?;
        if claims.kind != TokenKind::Access {
            return Err(AppError::unauthorized("access token required"));
        }

        let user = state
            .users
            .find_by_id(claims.sub)
            .await?
            .filter(|u| u.active)
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token for unknown or inactive user");
                AppError::unauthorized("user not found or inactive")
            })?;

        Ok(AuthUser(user))
    }
}
