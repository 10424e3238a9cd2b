use rust_decimal::Decimal;

use super::{
    dto::{RecipeListParams, RecipeRequest},
    repo_types::{RecipeDetailRecord, RecipeDraft, RecipeFilter},
};
use crate::error::AppError;

const MAX_TEXT_LEN: usize = 255;
const PRICE_SCALE: u32 = 2;

/// Parses a comma-separated id list such as `1,2,3`. Blank elements are
/// skipped; a list with no ids at all yields `None` so it does not filter.
pub fn parse_id_list(name: &str, raw: Option<&str>) -> Result<Option<Vec<i64>>, AppError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id = part.parse::<i64>().map_err(|_| {
            AppError::validation(format!("{name} must be a comma-separated list of integers"))
        })?;
        ids.push(id);
    }
    if ids.is_empty() {
        return Ok(None);
    }
    ids.sort_unstable();
    ids.dedup();
    Ok(Some(ids))
}

pub fn filter_from_params(params: &RecipeListParams) -> Result<RecipeFilter, AppError> {
    Ok(RecipeFilter {
        step_ids: parse_id_list("Steps", params.steps.as_deref())?,
        ingredient_ids: parse_id_list("ingredients", params.ingredients.as_deref())?,
    })
}

fn validate_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::validation("title must not be empty"));
    }
    if title.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::validation("title is too long"));
    }
    Ok(title.to_string())
}

fn validate_time(minutes: i32) -> Result<i32, AppError> {
    if minutes < 0 {
        return Err(AppError::validation("time_minutes must not be negative"));
    }
    Ok(minutes)
}

/// Accepts 0.00..=999.99 with at most two decimal places and pins the scale
/// to two so the price always renders as e.g. `"5.50"`.
fn validate_price(price: Decimal) -> Result<Decimal, AppError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::validation("price must not be negative"));
    }
    if price.normalize().scale() > PRICE_SCALE {
        return Err(AppError::validation("price must have at most 2 decimal places"));
    }
    if price >= Decimal::from(1000) {
        return Err(AppError::validation("price must have at most 5 digits"));
    }
    let mut price = price.normalize();
    price.rescale(PRICE_SCALE);
    Ok(price)
}

fn validate_link(link: &str) -> Result<String, AppError> {
    let link = link.trim();
    if link.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::validation("link is too long"));
    }
    Ok(link.to_string())
}

fn normalize_ids(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::validation(format!("{field} is required")))
}

/// Builds the draft for create and full update. `title`, `time_minutes` and
/// `price` are required; links default to none.
pub fn draft_from_request(req: RecipeRequest) -> Result<RecipeDraft, AppError> {
    Ok(RecipeDraft {
        title: validate_title(&required(req.title, "title")?)?,
        time_minutes: validate_time(required(req.time_minutes, "time_minutes")?)?,
        price: validate_price(required(req.price, "price")?)?,
        link: validate_link(req.link.as_deref().unwrap_or_default())?,
        ingredient_ids: normalize_ids(req.ingredients.unwrap_or_default()),
        tag_ids: normalize_ids(req.tags.unwrap_or_default()),
    })
}

/// Merges a partial update into the current state of a recipe.
pub fn apply_patch(current: &RecipeDetailRecord, req: RecipeRequest) -> Result<RecipeDraft, AppError> {
    let title = match req.title {
        Some(t) => validate_title(&t)?,
        None => current.recipe.title.clone(),
    };
    let time_minutes = match req.time_minutes {
        Some(m) => validate_time(m)?,
        None => current.recipe.time_minutes,
    };
    let price = match req.price {
        Some(p) => validate_price(p)?,
        None => current.recipe.price,
    };
    let link = match req.link {
        Some(l) => validate_link(&l)?,
        None => current.recipe.link.clone(),
    };
    Ok(RecipeDraft {
        title,
        time_minutes,
        price,
        link,
        ingredient_ids: normalize_ids(req.ingredients.unwrap_or_else(|| current.ingredient_ids())),
        tag_ids: normalize_ids(req.tags.unwrap_or_else(|| current.tag_ids())),
    })
}
