use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Internal user record, independent of any single auth provider.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub external_id: Option<String>, // subject id of the linked provider
    pub email: String,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub email_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub external_id: String,
    pub email: String,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub email_verified: bool,
}

/// Fields refreshed from the latest identity claims; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ClaimsUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub email_verified: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub currency: Option<String>,
}
