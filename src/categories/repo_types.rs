use serde::{Serialize, Serializer};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Who owns a category. Global categories are shared and read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Global,
    OwnedBy(Uuid),
}

impl Ownership {
    pub fn owner(&self) -> Option<Uuid> {
        match self {
            Ownership::Global => None,
            Ownership::OwnedBy(id) => Some(*id),
        }
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Ownership::Global)
    }

    /// Only the owning user may rename, recolor or delete a category.
    pub fn is_mutable_by(&self, user_id: Uuid) -> bool {
        matches!(self, Ownership::OwnedBy(owner) if *owner == user_id)
    }
}

impl From<Option<Uuid>> for Ownership {
    fn from(owner: Option<Uuid>) -> Self {
        owner.map_or(Ownership::Global, Ownership::OwnedBy)
    }
}

// Serialized as the nullable `userId` clients already understand.
impl Serialize for Ownership {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.owner().serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub icon: String,
    pub color: Option<String>,
    #[serde(rename = "userId")]
    pub owner: Ownership,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub icon: String,
    pub color: Option<String>,
    pub created_at: OffsetDateTime,
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            icon: r.icon,
            color: r.color,
            owner: Ownership::from(r.user_id),
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub icon: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_categories_are_never_mutable() {
        let caller = Uuid::new_v4();
        assert!(!Ownership::Global.is_mutable_by(caller));
        assert!(Ownership::OwnedBy(caller).is_mutable_by(caller));
        assert!(!Ownership::OwnedBy(Uuid::new_v4()).is_mutable_by(caller));
    }

    #[test]
    fn ownership_serializes_as_nullable_user_id() {
        let owner = Uuid::new_v4();
        assert_eq!(serde_json::to_value(Ownership::Global).unwrap(), serde_json::Value::Null);
        assert_eq!(
            serde_json::to_value(Ownership::OwnedBy(owner)).unwrap(),
            serde_json::json!(owner.to_string())
        );
        assert_eq!(Ownership::from(None), Ownership::Global);
        assert!(Ownership::from(None).is_global());
    }
}
