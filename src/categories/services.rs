use tracing::info;
use uuid::Uuid;

use super::{
    repo::CategoryStore,
    repo_types::{Category, NewCategory, Ownership},
};
use crate::store::Store;

pub const DEFAULT_ICON: &str = "tag";
pub const DEFAULT_COLOR: &str = "#6B7280";

/// Finds the category a transaction should point at by name.
///
/// Global categories win over the user's own; when neither exists a new
/// user-owned category with the default icon is created.
pub async fn resolve_category(
    store: &dyn Store,
    user_id: Uuid,
    name: &str,
) -> anyhow::Result<Category> {
    let name = name.trim();
    anyhow::ensure!(!name.is_empty(), "category name is empty");

    if let Some(global) = store.find_category_by_name(Ownership::Global, name).await? {
        return Ok(global);
    }
    if let Some(own) = store
        .find_category_by_name(Ownership::OwnedBy(user_id), name)
        .await?
    {
        return Ok(own);
    }

    let created = store
        .create_category(
            user_id,
            NewCategory {
                name: name.to_string(),
                icon: DEFAULT_ICON.to_string(),
                color: Some(DEFAULT_COLOR.to_string()),
            },
        )
        .await?;
    info!(category_id = created.id, %user_id, name = %created.name, "category created");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[tokio::test]
    async fn creates_user_category_when_missing() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        let groceries = resolve_category(&store, user, " Groceries ").await.unwrap();
        assert_eq!(groceries.name, "Groceries");
        assert_eq!(groceries.icon, DEFAULT_ICON);
        assert_eq!(groceries.owner, Ownership::OwnedBy(user));

        let again = resolve_category(&store, user, "Groceries").await.unwrap();
        assert_eq!(again.id, groceries.id);
        assert_eq!(store.list_categories(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn global_category_takes_precedence() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let own = resolve_category(&store, user, "Salary").await.unwrap();
        let global = store.seed_global_category("Salary", "briefcase", None).await;

        let picked = resolve_category(&store, user, "Salary").await.unwrap();
        assert_eq!(picked.id, global.id);
        assert_ne!(picked.id, own.id);
        assert!(picked.owner.is_global());
    }

    #[tokio::test]
    async fn names_are_exact_and_per_user() {
        let store = MemoryStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let cat_a = resolve_category(&store, a, "Rent").await.unwrap();
        let cat_b = resolve_category(&store, b, "Rent").await.unwrap();
        let lower = resolve_category(&store, a, "rent").await.unwrap();
        assert_ne!(cat_a.id, cat_b.id);
        assert_ne!(cat_a.id, lower.id);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let store = MemoryStore::new();
        assert!(resolve_category(&store, Uuid::new_v4(), "  ").await.is_err());
    }
}
