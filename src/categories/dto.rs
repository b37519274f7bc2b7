use serde::Deserialize;

use super::repo_types::CategoryPatch;
use crate::api::non_blank;

#[derive(Debug, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl From<UpdateCategoryRequest> for CategoryPatch {
    fn from(r: UpdateCategoryRequest) -> Self {
        CategoryPatch {
            name: non_blank(r.name),
            icon: non_blank(r.icon),
            color: non_blank(r.color),
        }
    }
}
