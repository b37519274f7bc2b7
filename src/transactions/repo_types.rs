use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    accounts::repo_types::Account,
    categories::repo_types::{Category, Ownership},
};

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    pub user_id: Uuid,
    pub account_id: i64,
    pub category_id: Option<i64>, // cleared when the category is deleted
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
    pub amount: Decimal,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A transaction with its account and category, as listed to clients.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetails {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub account: Account,
    pub category: Option<Category>,
}

#[derive(Debug, FromRow)]
pub struct TransactionDetailsRow {
    pub id: i64,
    pub user_id: Uuid,
    pub account_id: i64,
    pub category_id: Option<i64>,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub account_name: String,
    pub account_type: String,
    pub account_created_at: OffsetDateTime,
    pub category_name: Option<String>,
    pub category_icon: Option<String>,
    pub category_color: Option<String>,
    pub category_user_id: Option<Uuid>,
    pub category_created_at: Option<OffsetDateTime>,
}

impl From<TransactionDetailsRow> for TransactionDetails {
    fn from(r: TransactionDetailsRow) -> Self {
        let category = match (r.category_id, r.category_name, r.category_icon, r.category_created_at) {
            (Some(id), Some(name), Some(icon), Some(created_at)) => Some(Category {
                id,
                name,
                icon,
                color: r.category_color,
                owner: Ownership::from(r.category_user_id),
                created_at,
            }),
            _ => None,
        };
        Self {
            account: Account {
                id: r.account_id,
                user_id: r.user_id,
                name: r.account_name,
                kind: r.account_type,
                created_at: r.account_created_at,
            },
            category,
            transaction: Transaction {
                id: r.id,
                user_id: r.user_id,
                account_id: r.account_id,
                category_id: r.category_id,
                kind: r.kind,
                amount: r.amount,
                description: r.description,
                date: r.date,
                created_at: r.created_at,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: i64,
    pub category_id: i64,
    pub kind: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: OffsetDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub kind: Option<String>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub date: Option<OffsetDateTime>,
}
