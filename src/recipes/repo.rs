use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{Recipe, RecipeDetailRecord, RecipeDraft, RecipeFilter, RecipeRecord};
use crate::{
    attributes::repo_types::{Attr, AttrKind},
    error::StoreError,
};

/// Storage for recipes and their ingredient/tag links. Every call is scoped to
/// `owner`; rows of other users behave as if they did not exist.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    async fn list(&self, owner: Uuid, filter: &RecipeFilter) -> Result<Vec<RecipeRecord>, StoreError>;
    async fn get(&self, owner: Uuid, id: i64) -> Result<Option<RecipeDetailRecord>, StoreError>;
    /// Fails with `StoreError::UnknownReferences` when a linked id is not owned by `owner`.
    async fn create(&self, owner: Uuid, draft: &RecipeDraft) -> Result<RecipeRecord, StoreError>;
    async fn update(
        &self,
        owner: Uuid,
        id: i64,
        draft: &RecipeDraft,
    ) -> Result<Option<RecipeRecord>, StoreError>;
    async fn delete(&self, owner: Uuid, id: i64) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct PgRecipes {
    db: PgPool,
}

impl PgRecipes {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn links_for(
        &self,
        kind: AttrKind,
        recipe_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<i64>>, StoreError> {
        let (link_table, link_col) = kind.link();
        let sql = format!(
            r#"
            SELECT recipe_id, {link_col}
              FROM {link_table}
             WHERE recipe_id = ANY($1)
             ORDER BY recipe_id, {link_col}
            "#
        );
        let rows = sqlx::query_as::<_, (i64, i64)>(&sql)
            .bind(recipe_ids)
            .fetch_all(&self.db)
            .await?;
        let mut out: HashMap<i64, Vec<i64>> = HashMap::new();
        for (recipe_id, attr_id) in rows {
            out.entry(recipe_id).or_default().push(attr_id);
        }
        Ok(out)
    }

    async fn linked_attrs(&self, kind: AttrKind, recipe_id: i64) -> Result<Vec<Attr>, StoreError> {
        let (link_table, link_col) = kind.link();
        let sql = format!(
            r#"
            SELECT a.id, a.user_id, a.name
              FROM {table} a
              JOIN {link_table} l ON l.{link_col} = a.id
             WHERE l.recipe_id = $1
             ORDER BY a.id
            "#,
            table = kind.table(),
        );
        let rows = sqlx::query_as::<_, Attr>(&sql)
            .bind(recipe_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }
}

/// Ensures every id in `ids` names a row of `kind` owned by `owner`.
async fn check_owned_tx(
    tx: &mut Transaction<'_, Postgres>,
    kind: AttrKind,
    owner: Uuid,
    ids: &[i64],
) -> Result<(), StoreError> {
    if ids.is_empty() {
        return Ok(());
    }
    let sql = format!(
        "SELECT id FROM {} WHERE user_id = $1 AND id = ANY($2)",
        kind.table()
    );
    let found: Vec<i64> = sqlx::query_scalar::<_, i64>(&sql)
        .bind(owner)
        .bind(ids)
        .fetch_all(&mut **tx)
        .await?;
    let missing: Vec<i64> = ids.iter().copied().filter(|id| !found.contains(id)).collect();
    if !missing.is_empty() {
        return Err(StoreError::UnknownReferences { kind, ids: missing });
    }
    Ok(())
}

async fn replace_links_tx(
    tx: &mut Transaction<'_, Postgres>,
    kind: AttrKind,
    recipe_id: i64,
    ids: &[i64],
) -> Result<(), StoreError> {
    let (link_table, link_col) = kind.link();
    sqlx::query(&format!("DELETE FROM {link_table} WHERE recipe_id = $1"))
        .bind(recipe_id)
        .execute(&mut **tx)
        .await?;
    if !ids.is_empty() {
        sqlx::query(&format!(
            "INSERT INTO {link_table} (recipe_id, {link_col}) SELECT $1, UNNEST($2::BIGINT[])"
        ))
        .bind(recipe_id)
        .bind(ids)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn write_links_tx(
    tx: &mut Transaction<'_, Postgres>,
    owner: Uuid,
    recipe_id: i64,
    draft: &RecipeDraft,
) -> Result<(), StoreError> {
    check_owned_tx(tx, AttrKind::Ingredient, owner, &draft.ingredient_ids).await?;
    check_owned_tx(tx, AttrKind::Step, owner, &draft.tag_ids).await?;
    replace_links_tx(tx, AttrKind::Ingredient, recipe_id, &draft.ingredient_ids).await?;
    replace_links_tx(tx, AttrKind::Step, recipe_id, &draft.tag_ids).await?;
    Ok(())
}

fn record(recipe: Recipe, draft: &RecipeDraft) -> RecipeRecord {
    RecipeRecord {
        recipe,
        ingredient_ids: draft.ingredient_ids.clone(),
        tag_ids: draft.tag_ids.clone(),
    }
}

#[async_trait]
impl RecipeRepository for PgRecipes {
    async fn list(&self, owner: Uuid, filter: &RecipeFilter) -> Result<Vec<RecipeRecord>, StoreError> {
        let recipes = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT r.id, r.user_id, r.title, r.time_minutes, r.price, r.link
              FROM recipes r
             WHERE r.user_id = $1
               AND ($2::BIGINT[] IS NULL OR EXISTS (
                    SELECT 1 FROM recipe_tags t
                     WHERE t.recipe_id = r.id AND t.step_id = ANY($2)))
               AND ($3::BIGINT[] IS NULL OR EXISTS (
                    SELECT 1 FROM recipe_ingredients i
                     WHERE i.recipe_id = r.id AND i.ingredient_id = ANY($3)))
             ORDER BY r.id
            "#,
        )
        .bind(owner)
        .bind(filter.step_ids.as_deref())
        .bind(filter.ingredient_ids.as_deref())
        .fetch_all(&self.db)
        .await?;

        let ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();
        let mut ingredients = self.links_for(AttrKind::Ingredient, &ids).await?;
        let mut tags = self.links_for(AttrKind::Step, &ids).await?;
        Ok(recipes
            .into_iter()
            .map(|recipe| RecipeRecord {
                ingredient_ids: ingredients.remove(&recipe.id).unwrap_or_default(),
                tag_ids: tags.remove(&recipe.id).unwrap_or_default(),
                recipe,
            })
            .collect())
    }

    async fn get(&self, owner: Uuid, id: i64) -> Result<Option<RecipeDetailRecord>, StoreError> {
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, user_id, title, time_minutes, price, link
              FROM recipes
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?;
        let Some(recipe) = recipe else {
            return Ok(None);
        };
        let ingredients = self.linked_attrs(AttrKind::Ingredient, id).await?;
        let tags = self.linked_attrs(AttrKind::Step, id).await?;
        Ok(Some(RecipeDetailRecord {
            recipe,
            ingredients,
            tags,
        }))
    }

    async fn create(&self, owner: Uuid, draft: &RecipeDraft) -> Result<RecipeRecord, StoreError> {
        let mut tx = self.db.begin().await?;
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            INSERT INTO recipes (user_id, title, time_minutes, price, link)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, title, time_minutes, price, link
            "#,
        )
        .bind(owner)
        .bind(&draft.title)
        .bind(draft.time_minutes)
        .bind(draft.price)
        .bind(&draft.link)
        .fetch_one(&mut *tx)
        .await?;
        write_links_tx(&mut tx, owner, recipe.id, draft).await?;
        tx.commit().await?;
        Ok(record(recipe, draft))
    }

    async fn update(
        &self,
        owner: Uuid,
        id: i64,
        draft: &RecipeDraft,
    ) -> Result<Option<RecipeRecord>, StoreError> {
        let mut tx = self.db.begin().await?;
        let recipe = sqlx::query_as::<_, Recipe>(
            r#"
            UPDATE recipes
               SET title = $3, time_minutes = $4, price = $5, link = $6
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, title, time_minutes, price, link
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(&draft.title)
        .bind(draft.time_minutes)
        .bind(draft.price)
        .bind(&draft.link)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(recipe) = recipe else {
            return Ok(None);
        };
        write_links_tx(&mut tx, owner, recipe.id, draft).await?;
        tx.commit().await?;
        Ok(Some(record(recipe, draft)))
    }

    async fn delete(&self, owner: Uuid, id: i64) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
