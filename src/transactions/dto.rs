use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime};

use crate::{api::non_blank, error::AppError};

/// Body of `POST /transactions` and `PUT /transactions/:id`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Category name, resolved to a category record before writing.
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub account_id: Option<i64>,
}

impl TransactionRequest {
    pub fn normalized(self) -> Self {
        Self {
            kind: non_blank(self.kind),
            category: non_blank(self.category),
            description: non_blank(self.description),
            date: non_blank(self.date),
            ..self
        }
    }

    pub fn missing_for_create(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.kind.is_none() {
            missing.push("type");
        }
        if self.category.is_none() {
            missing.push("category");
        }
        if self.amount.is_none() {
            missing.push("amount");
        }
        if self.date.is_none() {
            missing.push("date");
        }
        if self.account_id.is_none() {
            missing.push("accountId");
        }
        missing
    }
}

/// Account ids arrive as numbers or numeric strings.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Num(i64),
        Text(String),
    }

    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Num(n)) => Ok(Some(n)),
        Some(RawId::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawId::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom("accountId must be numeric")),
    }
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_occurred_at(raw: &str) -> Result<OffsetDateTime, AppError> {
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(ts);
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map(|d| d.midnight().assume_utc())
        .map_err(|_| AppError::InvalidAttribute("Invalid date".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use time::macros::datetime;

    #[test]
    fn parses_dates() {
        assert_eq!(
            parse_occurred_at("2024-03-05").unwrap(),
            datetime!(2024-03-05 00:00 UTC)
        );
        assert_eq!(
            parse_occurred_at("2024-03-05T10:30:00+02:00").unwrap(),
            datetime!(2024-03-05 08:30 UTC)
        );
        assert!(parse_occurred_at("05/03/2024").is_err());
    }

    #[test]
    fn accepts_string_and_number_fields() {
        let req: TransactionRequest = serde_json::from_str(
            r#"{"type":"expense","category":"Groceries","amount":"12.50","date":"2024-01-01","accountId":"7"}"#,
        )
        .unwrap();
        assert_eq!(req.account_id, Some(7));
        assert_eq!(req.amount, Some(Decimal::from_str("12.50").unwrap()));
        assert!(req.missing_for_create().is_empty());

        let req: TransactionRequest =
            serde_json::from_str(r#"{"amount": 3.25, "accountId": 9}"#).unwrap();
        assert_eq!(req.account_id, Some(9));
        assert_eq!(req.amount, Some(Decimal::from_str("3.25").unwrap()));
    }

    #[test]
    fn reports_missing_fields() {
        let req = TransactionRequest {
            kind: Some("  ".into()),
            ..Default::default()
        }
        .normalized();
        assert_eq!(
            req.missing_for_create(),
            vec!["type", "category", "amount", "date", "accountId"]
        );
    }

    #[test]
    fn rejects_non_numeric_account_id() {
        let res = serde_json::from_str::<TransactionRequest>(r#"{"accountId":"abc"}"#);
        assert!(res.is_err());
    }
}
