use serde::{Deserialize, Serialize};

use super::repo_types::Attr;

#[derive(Debug, Deserialize)]
pub struct CreateAttrRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ListAttrParams {
    pub assigned_only: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttrResponse {
    pub id: i64,
    pub name: String,
}

impl From<Attr> for AttrResponse {
    fn from(a: Attr) -> Self {
        Self {
            id: a.id,
            name: a.name,
        }
    }
}
