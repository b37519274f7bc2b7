use axum::async_trait;
use uuid::Uuid;

use super::repo_types::{ClaimsUpdate, NewUser, ProfileUpdate, User};
use crate::store::PgStore;

const USER_COLUMNS: &str =
    "id, external_id, email, name, currency, email_verified, created_at, updated_at";

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// Inserts a user; a concurrent insert for the same external id returns the existing row.
    async fn create_user(&self, new: NewUser) -> anyhow::Result<User>;
    async fn refresh_user_claims(&self, id: Uuid, update: ClaimsUpdate) -> anyhow::Result<User>;
    /// Points an existing user at a new provider subject.
    async fn link_user(
        &self,
        id: Uuid,
        external_id: &str,
        update: ClaimsUpdate,
    ) -> anyhow::Result<User>;
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> anyhow::Result<User>;
    async fn list_users(&self) -> anyhow::Result<Vec<User>>;
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, new: NewUser) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (external_id, email, name, currency, email_verified)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (external_id) DO UPDATE SET updated_at = users.updated_at
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.external_id)
        .bind(&new.email)
        .bind(&new.name)
        .bind(&new.currency)
        .bind(new.email_verified)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn refresh_user_claims(&self, id: Uuid, update: ClaimsUpdate) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET email = COALESCE($2, email),
                   name = COALESCE($3, name),
                   email_verified = $4,
                   updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.email)
        .bind(&update.name)
        .bind(update.email_verified)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn link_user(
        &self,
        id: Uuid,
        external_id: &str,
        update: ClaimsUpdate,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET external_id = $2,
                   name = COALESCE($3, name),
                   email_verified = $4,
                   updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(external_id)
        .bind(&update.name)
        .bind(update.email_verified)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
               SET name = COALESCE($2, name),
                   currency = COALESCE($3, currency),
                   updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.currency)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }
}
