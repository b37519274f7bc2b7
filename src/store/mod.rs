use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

pub mod memory;

use crate::{
    accounts::repo::AccountStore, categories::repo::CategoryStore,
    transactions::repo::TransactionStore, users::repo::UserStore,
};

/// Everything the handlers need from persistence.
pub trait Store: UserStore + AccountStore + CategoryStore + TransactionStore {}

impl<T> Store for T where T: UserStore + AccountStore + CategoryStore + TransactionStore {}

/// A rename would collide with another record of the same owner.
#[derive(Debug, thiserror::Error)]
#[error("name already in use")]
pub struct NameTaken;

#[derive(Clone)]
pub struct PgStore {
    pub db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;
        info!("database migrations applied");
        Ok(Self { db })
    }
}
