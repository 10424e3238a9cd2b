use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::attributes::repo_types::Attr;

/// Recipe row without its links.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Recipe {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
}

/// Recipe with the ids it links to, both sorted ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeRecord {
    pub recipe: Recipe,
    pub ingredient_ids: Vec<i64>,
    pub tag_ids: Vec<i64>,
}

/// Recipe with its linked rows resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDetailRecord {
    pub recipe: Recipe,
    pub ingredients: Vec<Attr>,
    pub tags: Vec<Attr>,
}

impl RecipeDetailRecord {
    pub fn ingredient_ids(&self) -> Vec<i64> {
        self.ingredients.iter().map(|a| a.id).collect()
    }

    pub fn tag_ids(&self) -> Vec<i64> {
        self.tags.iter().map(|a| a.id).collect()
    }
}

/// Validated values for a recipe insert or full update. Id lists are sorted
/// and free of duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeDraft {
    pub title: String,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
    pub ingredient_ids: Vec<i64>,
    pub tag_ids: Vec<i64>,
}

/// Recipe list filter. A recipe matches a list when it links to any of its
/// ids; when both lists are set it must match both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub step_ids: Option<Vec<i64>>,
    pub ingredient_ids: Option<Vec<i64>>,
}
