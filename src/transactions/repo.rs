use axum::async_trait;
use uuid::Uuid;

use super::repo_types::{
    NewTransaction, Transaction, TransactionDetails, TransactionDetailsRow, TransactionPatch,
};
use crate::store::PgStore;

const TRANSACTION_COLUMNS: &str =
    "id, user_id, account_id, category_id, type, amount, description, date, created_at";

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Inserts only when the referenced account belongs to `user_id`; `None` otherwise.
    async fn create_transaction(
        &self,
        user_id: Uuid,
        new: NewTransaction,
    ) -> anyhow::Result<Option<Transaction>>;
    /// Newest first, with account and category attached.
    async fn list_transactions(&self, user_id: Uuid) -> anyhow::Result<Vec<TransactionDetails>>;
    async fn owns_transaction(&self, user_id: Uuid, id: i64) -> anyhow::Result<bool>;
    /// Zero when the transaction is missing, not owned, or the new account is not owned.
    async fn update_transaction(
        &self,
        user_id: Uuid,
        id: i64,
        patch: TransactionPatch,
    ) -> anyhow::Result<u64>;
    async fn delete_transaction(&self, user_id: Uuid, id: i64) -> anyhow::Result<u64>;
}

#[async_trait]
impl TransactionStore for PgStore {
    async fn create_transaction(
        &self,
        user_id: Uuid,
        new: NewTransaction,
    ) -> anyhow::Result<Option<Transaction>> {
        let row = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            INSERT INTO transactions (user_id, account_id, category_id, type, amount, description, date)
            SELECT $1, a.id, $3, $4, $5, $6, $7
              FROM accounts a
             WHERE a.id = $2 AND a.user_id = $1
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(new.account_id)
        .bind(new.category_id)
        .bind(&new.kind)
        .bind(new.amount)
        .bind(&new.description)
        .bind(new.date)
        .fetch_optional(&self.db)
        .await?;
        Ok(row)
    }

    async fn list_transactions(&self, user_id: Uuid) -> anyhow::Result<Vec<TransactionDetails>> {
        let rows = sqlx::query_as::<_, TransactionDetailsRow>(
            r#"
            SELECT t.id, t.user_id, t.account_id, t.category_id, t.type, t.amount,
                   t.description, t.date, t.created_at,
                   a.name       AS account_name,
                   a.type       AS account_type,
                   a.created_at AS account_created_at,
                   c.name       AS category_name,
                   c.icon       AS category_icon,
                   c.color      AS category_color,
                   c.user_id    AS category_user_id,
                   c.created_at AS category_created_at
              FROM transactions t
              JOIN accounts a ON a.id = t.account_id
              LEFT JOIN categories c ON c.id = t.category_id
             WHERE t.user_id = $1
             ORDER BY t.date DESC, t.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(TransactionDetails::from).collect())
    }

    async fn owns_transaction(&self, user_id: Uuid, id: i64) -> anyhow::Result<bool> {
        let owned = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM transactions WHERE id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;
        Ok(owned)
    }

    async fn update_transaction(
        &self,
        user_id: Uuid,
        id: i64,
        patch: TransactionPatch,
    ) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE transactions
               SET account_id  = COALESCE($3, account_id),
                   category_id = COALESCE($4, category_id),
                   type        = COALESCE($5, type),
                   amount      = COALESCE($6, amount),
                   description = COALESCE($7, description),
                   date        = COALESCE($8, date)
             WHERE id = $1 AND user_id = $2
               AND ($3::BIGINT IS NULL
                    OR EXISTS (SELECT 1 FROM accounts a WHERE a.id = $3 AND a.user_id = $2))
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(patch.account_id)
        .bind(patch.category_id)
        .bind(&patch.kind)
        .bind(patch.amount)
        .bind(&patch.description)
        .bind(patch.date)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected())
    }

    async fn delete_transaction(&self, user_id: Uuid, id: i64) -> anyhow::Result<u64> {
        let res = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }
}
