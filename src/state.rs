use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::{
    attributes::repo::{AttrRepository, PgAttributes},
    auth::JwtKeys,
    config::{JwtConfig, StoreBackend, StoreConfig},
    memory::MemoryStore,
    recipes::repo::{PgRecipes, RecipeRepository},
    users::repo::{PgUsers, UserRepository},
};

/// Repository handles for one storage backend.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub attrs: Arc<dyn AttrRepository>,
    pub recipes: Arc<dyn RecipeRepository>,
}

impl Repositories {
    pub async fn connect(config: &StoreConfig) -> anyhow::Result<Self> {
        match config.backend {
            StoreBackend::Postgres => {
                let db = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect(&config.database_url)
                    .await
                    .context("connect to database")?;

                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;
                info!("database ready");

                Ok(Self {
                    users: Arc::new(PgUsers::new(db.clone())),
                    attrs: Arc::new(PgAttributes::new(db.clone())),
                    recipes: Arc::new(PgRecipes::new(db)),
                })
            }
            StoreBackend::Memory => {
                warn!("using in-memory store; data is lost on exit");
                Ok(Self::memory(MemoryStore::new()))
            }
        }
    }

    pub fn memory(store: MemoryStore) -> Self {
        Self {
            users: Arc::new(store.clone()),
            attrs: Arc::new(store.clone()),
            recipes: Arc::new(store),
        }
    }
}

/// Everything a handler needs, passed explicitly through axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub jwt: JwtKeys,
    pub users: Arc<dyn UserRepository>,
    pub attrs: Arc<dyn AttrRepository>,
    pub recipes: Arc<dyn RecipeRepository>,
}

impl AppState {
    pub fn new(jwt: &JwtConfig, repos: Repositories) -> Self {
        Self {
            jwt: JwtKeys::from(jwt),
            users: repos.users,
            attrs: repos.attrs,
            recipes: repos.recipes,
        }
    }

    #[cfg(test)]
    pub fn fake(store: MemoryStore) -> Self {
        let jwt = JwtConfig {
            secret: "test".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        };
        Self::new(&jwt, Repositories::memory(store))
    }
}
