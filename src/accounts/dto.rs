use serde::Deserialize;

use super::repo_types::AccountPatch;
use crate::api::non_blank;

/// Body of `POST /accounts` and `PUT /accounts/:id`.
#[derive(Debug, Default, Deserialize)]
pub struct AccountRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl From<AccountRequest> for AccountPatch {
    fn from(r: AccountRequest) -> Self {
        AccountPatch {
            name: non_blank(r.name),
            kind: non_blank(r.kind),
        }
    }
}
