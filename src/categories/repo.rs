use axum::async_trait;
use uuid::Uuid;

use super::repo_types::{Category, CategoryPatch, CategoryRow, NewCategory, Ownership};
use crate::store::{NameTaken, PgStore};

#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// The user's own categories plus every global one, by name.
    async fn list_categories(&self, user_id: Uuid) -> anyhow::Result<Vec<Category>>;
    async fn find_category_by_name(
        &self,
        owner: Ownership,
        name: &str,
    ) -> anyhow::Result<Option<Category>>;
    async fn create_category(&self, user_id: Uuid, new: NewCategory) -> anyhow::Result<Category>;
    /// Zero means missing, global, or owned by someone else. Fails with `NameTaken`
    /// when the new name collides with another of the user's categories.
    async fn update_category(
        &self,
        user_id: Uuid,
        id: i64,
        patch: CategoryPatch,
    ) -> anyhow::Result<u64>;
    async fn delete_category(&self, user_id: Uuid, id: i64) -> anyhow::Result<u64>;
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn list_categories(&self, user_id: Uuid) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, user_id, name, icon, color, created_at
              FROM categories
             WHERE user_id = $1 OR user_id IS NULL
             ORDER BY name ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn find_category_by_name(
        &self,
        owner: Ownership,
        name: &str,
    ) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, user_id, name, icon, color, created_at
              FROM categories
             WHERE user_id IS NOT DISTINCT FROM $1 AND name = $2
             LIMIT 1
            "#,
        )
        .bind(owner.owner())
        .bind(name)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(Category::from))
    }

    async fn create_category(&self, user_id: Uuid, new: NewCategory) -> anyhow::Result<Category> {
        // A concurrent create of the same name returns the row that won.
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            INSERT INTO categories (user_id, name, icon, color)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, name) WHERE user_id IS NOT NULL
            DO UPDATE SET icon = categories.icon
            RETURNING id, user_id, name, icon, color, created_at
            "#,
        )
        .bind(user_id)
        .bind(&new.name)
        .bind(&new.icon)
        .bind(&new.color)
        .fetch_one(&self.db)
        .await?;
        Ok(row.into())
    }

    async fn update_category(
        &self,
        user_id: Uuid,
        id: i64,
        patch: CategoryPatch,
    ) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE categories
               SET name = COALESCE($3, name),
                   icon = COALESCE($4, icon),
                   color = COALESCE($5, color)
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&patch.name)
        .bind(&patch.icon)
        .bind(&patch.color)
        .execute(&self.db)
        .await;

        match res {
            Ok(done) => Ok(done.rows_affected()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(NameTaken.into()),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_category(&self, user_id: Uuid, id: i64) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM categories WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }
}
