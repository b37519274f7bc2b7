use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    repo::UserStore,
    repo_types::{ClaimsUpdate, NewUser, User},
};
use crate::{
    auth::Identity,
    error::{AppError, AppResult, OrInternal},
    store::Store,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();
    is_valid_email(&email).then_some(email)
}

/// Profile data a client may send alongside its credential.
#[derive(Debug, Clone, Default)]
pub struct ProfileHints {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Email and name to apply, with the verified claim taking precedence for email.
fn effective_claims(identity: &Identity, hints: &ProfileHints) -> ClaimsUpdate {
    let email = identity
        .email
        .as_deref()
        .and_then(normalize_email)
        .or_else(|| hints.email.as_deref().and_then(normalize_email));
    let name = hints
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| identity.name.clone());
    ClaimsUpdate {
        email,
        name,
        email_verified: identity.email_verified,
    }
}

/// Looks the caller up without ever creating a record.
pub async fn find_user(store: &dyn Store, identity: &Identity) -> AppResult<Option<User>> {
    store
        .find_user_by_external_id(&identity.subject)
        .await
        .or_internal("Failed to load user")
}

/// Drops an email change that would take over another user's address.
async fn without_taken_email(
    store: &dyn Store,
    user: &User,
    mut claims: ClaimsUpdate,
) -> AppResult<ClaimsUpdate> {
    let Some(email) = claims.email.clone().filter(|e| *e != user.email) else {
        return Ok(claims);
    };
    let holder = store
        .find_user_by_email(&email)
        .await
        .or_internal("Failed to load user")?;
    if holder.is_some_and(|other| other.id != user.id) {
        warn!(user_id = %user.id, "email claim belongs to another user; keeping stored email");
        claims.email = None;
    }
    Ok(claims)
}

/// Maps the caller's identity onto an internal user, creating or linking one when needed.
///
/// Lookup order is external id, then email. A user found by email is re-pointed at the
/// caller's subject so moving between auth providers never duplicates a record. Without
/// an email nothing is created.
pub async fn resolve_user(
    store: &dyn Store,
    identity: &Identity,
    hints: &ProfileHints,
    default_currency: &str,
) -> AppResult<User> {
    let claims = effective_claims(identity, hints);

    if let Some(user) = find_user(store, identity).await? {
        let claims = without_taken_email(store, &user, claims).await?;
        let user = store
            .refresh_user_claims(user.id, claims)
            .await
            .or_internal("Failed to update user")?;
        return Ok(user);
    }

    let Some(email) = claims.email.clone() else {
        warn!(subject = %identity.subject, "cannot create user without an email claim");
        return Err(AppError::MissingRequiredAttribute(vec!["email"]));
    };

    let existing = store
        .find_user_by_email(&email)
        .await
        .or_internal("Failed to load user")?;

    if let Some(user) = existing {
        let user = store
            .link_user(user.id, &identity.subject, claims)
            .await
            .or_internal("Failed to link user")?;
        info!(user_id = %user.id, subject = %identity.subject, "linked existing user to new subject");
        return Ok(user);
    }

    let user = store
        .create_user(NewUser {
            external_id: identity.subject.clone(),
            email,
            name: claims.name,
            currency: Some(default_currency.to_string()),
            email_verified: claims.email_verified,
        })
        .await
        .or_internal("Failed to create user")?;
    info!(user_id = %user.id, subject = %identity.subject, "created user");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn alice() -> Identity {
        let mut id = Identity::new("provider_a|alice").with_email("Alice@Example.com");
        id.name = Some("Alice".into());
        id.email_verified = true;
        id
    }

    #[tokio::test]
    async fn creates_user_once_and_is_idempotent() {
        let store = MemoryStore::new();
        let hints = ProfileHints::default();

        let first = resolve_user(&store, &alice(), &hints, "USD").await.unwrap();
        let second = resolve_user(&store, &alice(), &hints, "USD").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.email, "alice@example.com");
        assert_eq!(first.currency.as_deref(), Some("USD"));
        assert_eq!(first.external_id.as_deref(), Some("provider_a|alice"));
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn existing_user_gets_latest_claims() {
        let store = MemoryStore::new();
        let created = resolve_user(&store, &alice(), &ProfileHints::default(), "USD")
            .await
            .unwrap();

        let mut newer = alice().with_email("alice@new.example.com");
        newer.name = Some("Alice Liddell".into());
        let updated = resolve_user(&store, &newer, &ProfileHints::default(), "USD")
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.email, "alice@new.example.com");
        assert_eq!(updated.name.as_deref(), Some("Alice Liddell"));
    }

    #[tokio::test]
    async fn missing_email_claim_keeps_stored_email() {
        let store = MemoryStore::new();
        let created = resolve_user(&store, &alice(), &ProfileHints::default(), "USD")
            .await
            .unwrap();

        let bare = Identity::new("provider_a|alice");
        let again = resolve_user(&store, &bare, &ProfileHints::default(), "USD")
            .await
            .unwrap();
        assert_eq!(again.id, created.id);
        assert_eq!(again.email, "alice@example.com");
        assert_eq!(again.name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn links_by_email_instead_of_duplicating() {
        let store = MemoryStore::new();
        let original = resolve_user(&store, &alice(), &ProfileHints::default(), "USD")
            .await
            .unwrap();

        let migrated = Identity::new("provider_b|0001").with_email("alice@example.com");
        let linked = resolve_user(&store, &migrated, &ProfileHints::default(), "USD")
            .await
            .unwrap();

        assert_eq!(linked.id, original.id);
        assert_eq!(linked.external_id.as_deref(), Some("provider_b|0001"));
        let users = store.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(store
            .find_user_by_external_id("provider_a|alice")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn email_held_by_another_user_is_not_taken_over() {
        let store = MemoryStore::new();
        let hints = ProfileHints::default();
        let a1 = Identity::new("a1").with_email("x@example.com");
        let b1 = Identity::new("b1").with_email("y@example.com");
        let a = resolve_user(&store, &a1, &hints, "USD").await.unwrap();
        let b = resolve_user(&store, &b1, &hints, "USD").await.unwrap();

        let b1_claims_x = Identity::new("b1").with_email("x@example.com");
        let again = resolve_user(&store, &b1_claims_x, &hints, "USD").await.unwrap();
        assert_eq!(again.id, b.id);
        assert_eq!(again.email, "y@example.com");

        let untouched = store.find_user_by_email("x@example.com").await.unwrap().unwrap();
        assert_eq!(untouched.id, a.id);
        assert_eq!(store.list_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn no_email_means_no_user() {
        let store = MemoryStore::new();
        let err = resolve_user(&store, &Identity::new("anon"), &ProfileHints::default(), "USD")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::MissingRequiredAttribute(ref f) if f == &vec!["email"]));
        assert!(store.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn body_hints_fill_gaps_but_never_override_claims() {
        let store = MemoryStore::new();
        let hints = ProfileHints {
            email: Some("someone@else.com".into()),
            name: Some("  Ada Lovelace ".into()),
        };
        let user = resolve_user(&store, &alice(), &hints, "EUR").await.unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(user.currency.as_deref(), Some("EUR"));

        let hinted_only = ProfileHints {
            email: Some("bob@example.com".into()),
            name: None,
        };
        let bob = resolve_user(&store, &Identity::new("bob"), &hinted_only, "USD")
            .await
            .unwrap();
        assert_eq!(bob.email, "bob@example.com");
    }

    #[tokio::test]
    async fn invalid_hint_email_is_ignored() {
        let store = MemoryStore::new();
        let hints = ProfileHints {
            email: Some("not-an-email".into()),
            name: None,
        };
        let err = resolve_user(&store, &Identity::new("x"), &hints, "USD")
            .await
            .unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
    }
}
