use axum::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::NameTaken;
use crate::{
    accounts::{
        repo::AccountStore,
        repo_types::{Account, AccountPatch, NewAccount},
    },
    categories::{
        repo::CategoryStore,
        repo_types::{Category, CategoryPatch, NewCategory, Ownership},
    },
    transactions::{
        repo::TransactionStore,
        repo_types::{NewTransaction, Transaction, TransactionDetails, TransactionPatch},
    },
    users::{
        repo::UserStore,
        repo_types::{ClaimsUpdate, NewUser, ProfileUpdate, User},
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    accounts: Vec<Account>,
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn user_mut(&mut self, id: Uuid) -> anyhow::Result<&mut User> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| anyhow::anyhow!("user {id} does not exist"))
    }

    fn owns_account(&self, user_id: Uuid, account_id: i64) -> bool {
        self.accounts
            .iter()
            .any(|a| a.id == account_id && a.user_id == user_id)
    }
}

/// In-process store with the same ownership semantics as `PgStore`.
///
/// Used by tests and by `STORE_BACKEND=memory` for running without a database.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_global_category(
        &self,
        name: &str,
        icon: &str,
        color: Option<&str>,
    ) -> Category {
        let mut t = self.tables.lock().await;
        let category = Category {
            id: t.next_id(),
            name: name.to_string(),
            icon: icon.to_string(),
            color: color.map(str::to_string),
            owner: Ownership::Global,
            created_at: OffsetDateTime::now_utc(),
        };
        t.categories.push(category.clone());
        category
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users
            .iter()
            .find(|u| u.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, new: NewUser) -> anyhow::Result<User> {
        let mut t = self.tables.lock().await;
        if let Some(existing) = t
            .users
            .iter()
            .find(|u| u.external_id.as_deref() == Some(new.external_id.as_str()))
        {
            return Ok(existing.clone());
        }
        anyhow::ensure!(
            t.users.iter().all(|u| u.email != new.email),
            "email {} already registered",
            new.email
        );
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            external_id: Some(new.external_id),
            email: new.email,
            name: new.name,
            currency: new.currency,
            email_verified: new.email_verified,
            created_at: now,
            updated_at: now,
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn refresh_user_claims(&self, id: Uuid, update: ClaimsUpdate) -> anyhow::Result<User> {
        let mut t = self.tables.lock().await;
        if let Some(email) = &update.email {
            anyhow::ensure!(
                t.users.iter().all(|u| u.id == id || &u.email != email),
                "email {email} already registered"
            );
        }
        let user = t.user_mut(id)?;
        if let Some(email) = update.email {
            user.email = email;
        }
        if let Some(name) = update.name {
            user.name = Some(name);
        }
        user.email_verified = update.email_verified;
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }

    async fn link_user(
        &self,
        id: Uuid,
        external_id: &str,
        update: ClaimsUpdate,
    ) -> anyhow::Result<User> {
        let mut t = self.tables.lock().await;
        anyhow::ensure!(
            t.users
                .iter()
                .all(|u| u.id == id || u.external_id.as_deref() != Some(external_id)),
            "subject {external_id} already linked"
        );
        let user = t.user_mut(id)?;
        user.external_id = Some(external_id.to_string());
        if let Some(name) = update.name {
            user.name = Some(name);
        }
        user.email_verified = update.email_verified;
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> anyhow::Result<User> {
        let mut t = self.tables.lock().await;
        let user = t.user_mut(id)?;
        if let Some(name) = update.name {
            user.name = Some(name);
        }
        if let Some(currency) = update.currency {
            user.currency = Some(currency);
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(user.clone())
    }

    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.tables.lock().await.users.clone())
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_account(&self, user_id: Uuid, new: NewAccount) -> anyhow::Result<Account> {
        let mut t = self.tables.lock().await;
        let account = Account {
            id: t.next_id(),
            user_id,
            name: new.name,
            kind: new.kind,
            created_at: OffsetDateTime::now_utc(),
        };
        t.accounts.push(account.clone());
        Ok(account)
    }

    async fn list_accounts(&self, user_id: Uuid) -> anyhow::Result<Vec<Account>> {
        let t = self.tables.lock().await;
        Ok(t.accounts
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn owns_account(&self, user_id: Uuid, id: i64) -> anyhow::Result<bool> {
        Ok(self.tables.lock().await.owns_account(user_id, id))
    }

    async fn update_account(
        &self,
        user_id: Uuid,
        id: i64,
        patch: AccountPatch,
    ) -> anyhow::Result<u64> {
        let mut t = self.tables.lock().await;
        let Some(account) = t
            .accounts
            .iter_mut()
            .find(|a| a.id == id && a.user_id == user_id)
        else {
            return Ok(0);
        };
        if let Some(name) = patch.name {
            account.name = name;
        }
        if let Some(kind) = patch.kind {
            account.kind = kind;
        }
        Ok(1)
    }

    async fn delete_account(&self, user_id: Uuid, id: i64) -> anyhow::Result<u64> {
        let mut t = self.tables.lock().await;
        let before = t.accounts.len();
        t.accounts.retain(|a| !(a.id == id && a.user_id == user_id));
        let removed = (before - t.accounts.len()) as u64;
        if removed > 0 {
            t.transactions.retain(|tx| tx.account_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list_categories(&self, user_id: Uuid) -> anyhow::Result<Vec<Category>> {
        let t = self.tables.lock().await;
        let mut out: Vec<Category> = t
            .categories
            .iter()
            .filter(|c| c.owner.is_global() || c.owner == Ownership::OwnedBy(user_id))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn find_category_by_name(
        &self,
        owner: Ownership,
        name: &str,
    ) -> anyhow::Result<Option<Category>> {
        let t = self.tables.lock().await;
        Ok(t.categories
            .iter()
            .find(|c| c.owner == owner && c.name == name)
            .cloned())
    }

    async fn create_category(&self, user_id: Uuid, new: NewCategory) -> anyhow::Result<Category> {
        let mut t = self.tables.lock().await;
        let owner = Ownership::OwnedBy(user_id);
        if let Some(existing) = t
            .categories
            .iter()
            .find(|c| c.owner == owner && c.name == new.name)
        {
            return Ok(existing.clone());
        }
        let category = Category {
            id: t.next_id(),
            name: new.name,
            icon: new.icon,
            color: new.color,
            owner,
            created_at: OffsetDateTime::now_utc(),
        };
        t.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        user_id: Uuid,
        id: i64,
        patch: CategoryPatch,
    ) -> anyhow::Result<u64> {
        let mut t = self.tables.lock().await;
        if !t
            .categories
            .iter()
            .any(|c| c.id == id && c.owner.is_mutable_by(user_id))
        {
            return Ok(0);
        }
        if let Some(name) = &patch.name {
            let clash = t.categories.iter().any(|c| {
                c.id != id && c.owner == Ownership::OwnedBy(user_id) && &c.name == name
            });
            if clash {
                return Err(NameTaken.into());
            }
        }
        let Some(category) = t
            .categories
            .iter_mut()
            .find(|c| c.id == id && c.owner.is_mutable_by(user_id))
        else {
            return Ok(0);
        };
        if let Some(name) = patch.name {
            category.name = name;
        }
        if let Some(icon) = patch.icon {
            category.icon = icon;
        }
        if let Some(color) = patch.color {
            category.color = Some(color);
        }
        Ok(1)
    }

    async fn delete_category(&self, user_id: Uuid, id: i64) -> anyhow::Result<u64> {
        let mut t = self.tables.lock().await;
        let before = t.categories.len();
        t.categories
            .retain(|c| !(c.id == id && c.owner.is_mutable_by(user_id)));
        let removed = (before - t.categories.len()) as u64;
        if removed > 0 {
            for tx in t.transactions.iter_mut().filter(|tx| tx.category_id == Some(id)) {
                tx.category_id = None;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn create_transaction(
        &self,
        user_id: Uuid,
        new: NewTransaction,
    ) -> anyhow::Result<Option<Transaction>> {
        let mut t = self.tables.lock().await;
        if !t.owns_account(user_id, new.account_id) {
            return Ok(None);
        }
        let transaction = Transaction {
            id: t.next_id(),
            user_id,
            account_id: new.account_id,
            category_id: Some(new.category_id),
            kind: new.kind,
            amount: new.amount,
            description: new.description,
            date: new.date,
            created_at: OffsetDateTime::now_utc(),
        };
        t.transactions.push(transaction.clone());
        Ok(Some(transaction))
    }

    async fn list_transactions(&self, user_id: Uuid) -> anyhow::Result<Vec<TransactionDetails>> {
        let t = self.tables.lock().await;
        let mut out = Vec::new();
        for tx in t.transactions.iter().filter(|tx| tx.user_id == user_id) {
            let Some(account) = t.accounts.iter().find(|a| a.id == tx.account_id) else {
                continue;
            };
            let category = tx
                .category_id
                .and_then(|cid| t.categories.iter().find(|c| c.id == cid))
                .cloned();
            out.push(TransactionDetails {
                transaction: tx.clone(),
                account: account.clone(),
                category,
            });
        }
        out.sort_by(|a, b| {
            b.transaction
                .date
                .cmp(&a.transaction.date)
                .then(b.transaction.id.cmp(&a.transaction.id))
        });
        Ok(out)
    }

    async fn owns_transaction(&self, user_id: Uuid, id: i64) -> anyhow::Result<bool> {
        let t = self.tables.lock().await;
        Ok(t.transactions
            .iter()
            .any(|tx| tx.id == id && tx.user_id == user_id))
    }

    async fn update_transaction(
        &self,
        user_id: Uuid,
        id: i64,
        patch: TransactionPatch,
    ) -> anyhow::Result<u64> {
        let mut t = self.tables.lock().await;
        if let Some(account_id) = patch.account_id {
            if !t.owns_account(user_id, account_id) {
                return Ok(0);
            }
        }
        let Some(tx) = t
            .transactions
            .iter_mut()
            .find(|tx| tx.id == id && tx.user_id == user_id)
        else {
            return Ok(0);
        };
        if let Some(account_id) = patch.account_id {
            tx.account_id = account_id;
        }
        if let Some(category_id) = patch.category_id {
            tx.category_id = Some(category_id);
        }
        if let Some(kind) = patch.kind {
            tx.kind = kind;
        }
        if let Some(amount) = patch.amount {
            tx.amount = amount;
        }
        if let Some(description) = patch.description {
            tx.description = Some(description);
        }
        if let Some(date) = patch.date {
            tx.date = date;
        }
        Ok(1)
    }

    async fn delete_transaction(&self, user_id: Uuid, id: i64) -> anyhow::Result<u64> {
        let mut t = self.tables.lock().await;
        let before = t.transactions.len();
        t.transactions
            .retain(|tx| !(tx.id == id && tx.user_id == user_id));
        Ok((before - t.transactions.len()) as u64)
    }
}
