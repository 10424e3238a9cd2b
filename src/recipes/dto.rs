use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::repo_types::{RecipeDetailRecord, RecipeRecord};
use crate::attributes::dto::AttrResponse;

/// Body of create, update and partial update. Which fields are required
/// depends on the verb; see `services`.
#[derive(Debug, Default, Deserialize)]
pub struct RecipeRequest {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<Decimal>,
    pub link: Option<String>,
    pub ingredients: Option<Vec<i64>>,
    pub tags: Option<Vec<i64>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipeListParams {
    #[serde(rename = "Steps", alias = "steps", alias = "tags")]
    pub steps: Option<String>,
    pub ingredients: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: i64,
    pub title: String,
    pub ingredients: Vec<i64>,
    pub tags: Vec<i64>,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
}

impl From<RecipeRecord> for RecipeResponse {
    fn from(r: RecipeRecord) -> Self {
        Self {
            id: r.recipe.id,
            title: r.recipe.title,
            ingredients: r.ingredient_ids,
            tags: r.tag_ids,
            time_minutes: r.recipe.time_minutes,
            price: r.recipe.price,
            link: r.recipe.link,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeDetailResponse {
    pub id: i64,
    pub title: String,
    pub ingredients: Vec<AttrResponse>,
    pub tags: Vec<AttrResponse>,
    pub time_minutes: i32,
    pub price: Decimal,
    pub link: String,
}

impl From<RecipeDetailRecord> for RecipeDetailResponse {
    fn from(r: RecipeDetailRecord) -> Self {
        Self {
            id: r.recipe.id,
            title: r.recipe.title,
            ingredients: r.ingredients.into_iter().map(AttrResponse::from).collect(),
            tags: r.tags.into_iter().map(AttrResponse::from).collect(),
            time_minutes: r.recipe.time_minutes,
            price: r.recipe.price,
            link: r.recipe.link,
        }
    }
}
