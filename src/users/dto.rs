use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::services::ProfileHints;

/// Body of `POST /auth/sync`. All fields are optional; providers that carry
/// the email in the token need not send anything.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<SyncRequest> for ProfileHints {
    fn from(r: SyncRequest) -> Self {
        let full_name = match (r.first_name, r.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first.trim(), last.trim())),
            _ => None,
        };
        ProfileHints {
            email: r.email,
            name: r.name.or(full_name),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncedUser {
    pub id: Uuid,
    pub external_id: Option<String>,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub user: SyncedUser,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub currency: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_and_last_name_are_joined() {
        let req: SyncRequest =
            serde_json::from_str(r#"{"firstName":"Ada","lastName":"Lovelace"}"#).unwrap();
        let hints = ProfileHints::from(req);
        assert_eq!(hints.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(hints.email, None);
    }

    #[test]
    fn explicit_name_wins_and_half_names_are_dropped() {
        let req: SyncRequest =
            serde_json::from_str(r#"{"name":"Ada","firstName":"A","lastName":"L"}"#).unwrap();
        assert_eq!(ProfileHints::from(req).name.as_deref(), Some("Ada"));

        let req: SyncRequest = serde_json::from_str(r#"{"firstName":"Ada"}"#).unwrap();
        assert_eq!(ProfileHints::from(req).name, None);
    }
}
