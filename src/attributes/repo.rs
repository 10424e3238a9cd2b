use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Attr, AttrKind};
use crate::error::StoreError;

/// Storage for user-owned recipe attributes (steps and ingredients).
#[async_trait]
pub trait AttrRepository: Send + Sync {
    /// Rows owned by `owner`, ordered by case-folded name descending, then
    /// by raw name and id descending. With `assigned_only` only rows linked to
    /// at least one recipe are returned.
    async fn list(
        &self,
        kind: AttrKind,
        owner: Uuid,
        assigned_only: bool,
    ) -> Result<Vec<Attr>, StoreError>;

    async fn create(&self, kind: AttrKind, owner: Uuid, name: &str) -> Result<Attr, StoreError>;
}

#[derive(Clone)]
pub struct PgAttributes {
    db: PgPool,
}

impl PgAttributes {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AttrRepository for PgAttributes {
    async fn list(
        &self,
        kind: AttrKind,
        owner: Uuid,
        assigned_only: bool,
    ) -> Result<Vec<Attr>, StoreError> {
        let (link_table, link_col) = kind.link();
        let sql = format!(
            r#"
            SELECT a.id, a.user_id, a.name
              FROM {table} a
             WHERE a.user_id = $1
               AND (NOT $2 OR EXISTS (SELECT 1 FROM {link_table} l WHERE l.{link_col} = a.id))
             ORDER BY LOWER(a.name) COLLATE "C" DESC, a.name COLLATE "C" DESC, a.id DESC
            "#,
            table = kind.table(),
        );
        let rows = sqlx::query_as::<_, Attr>(&sql)
            .bind(owner)
            .bind(assigned_only)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn create(&self, kind: AttrKind, owner: Uuid, name: &str) -> Result<Attr, StoreError> {
        let sql = format!(
            "INSERT INTO {} (user_id, name) VALUES ($1, $2) RETURNING id, user_id, name",
            kind.table()
        );
        let row = sqlx::query_as::<_, Attr>(&sql)
            .bind(owner)
            .bind(name)
            .fetch_one(&self.db)
            .await?;
        Ok(row)
    }
}
