use axum::async_trait;
use uuid::Uuid;

use super::repo_types::{Account, AccountPatch, NewAccount};
use crate::store::PgStore;

/// Account persistence. Every statement is filtered by the owning user.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn create_account(&self, user_id: Uuid, new: NewAccount) -> anyhow::Result<Account>;
    async fn list_accounts(&self, user_id: Uuid) -> anyhow::Result<Vec<Account>>;
    async fn owns_account(&self, user_id: Uuid, id: i64) -> anyhow::Result<bool>;
    /// Returns the number of rows changed; zero means missing or not owned.
    async fn update_account(
        &self,
        user_id: Uuid,
        id: i64,
        patch: AccountPatch,
    ) -> anyhow::Result<u64>;
    async fn delete_account(&self, user_id: Uuid, id: i64) -> anyhow::Result<u64>;
}

#[async_trait]
impl AccountStore for PgStore {
    async fn create_account(&self, user_id: Uuid, new: NewAccount) -> anyhow::Result<Account> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (user_id, name, type)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, type, created_at
            "#,
        )
        .bind(user_id)
        .bind(&new.name)
        .bind(&new.kind)
        .fetch_one(&self.db)
        .await?;
        Ok(account)
    }

    async fn list_accounts(&self, user_id: Uuid) -> anyhow::Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, user_id, name, type, created_at
              FROM accounts
             WHERE user_id = $1
             ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn owns_account(&self, user_id: Uuid, id: i64) -> anyhow::Result<bool> {
        let owned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM accounts WHERE id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(owned)
    }

    async fn update_account(
        &self,
        user_id: Uuid,
        id: i64,
        patch: AccountPatch,
    ) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE accounts
               SET name = COALESCE($3, name),
                   type = COALESCE($4, type)
             WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(&patch.name)
        .bind(&patch.kind)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected())
    }

    async fn delete_account(&self, user_id: Uuid, id: i64) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM accounts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }
}
