use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The two user-owned recipe attributes. Both share one schema and one
/// repository; the kind selects the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKind {
    Step,
    Ingredient,
}

impl AttrKind {
    pub(crate) fn table(self) -> &'static str {
        match self {
            AttrKind::Step => "steps",
            AttrKind::Ingredient => "ingredients",
        }
    }

    /// Join table linking this attribute to recipes, and its foreign key column.
    pub(crate) fn link(self) -> (&'static str, &'static str) {
        match self {
            AttrKind::Step => ("recipe_tags", "step_id"),
            AttrKind::Ingredient => ("recipe_ingredients", "ingredient_id"),
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            AttrKind::Step => "/steps",
            AttrKind::Ingredient => "/ingredients",
        }
    }

    /// Name of the recipe field holding ids of this kind.
    pub fn field(self) -> &'static str {
        match self {
            AttrKind::Step => "tags",
            AttrKind::Ingredient => "ingredients",
        }
    }
}

impl fmt::Display for AttrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttrKind::Step => "step",
            AttrKind::Ingredient => "ingredient",
        })
    }
}

/// A step or ingredient row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Attr {
    pub id: i64,
    pub user_id: Uuid,
    pub name: String,
}
