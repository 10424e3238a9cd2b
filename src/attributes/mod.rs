pub(crate) mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

use repo_types::AttrKind;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::router(AttrKind::Step))
        .merge(handlers::router(AttrKind::Ingredient))
}
