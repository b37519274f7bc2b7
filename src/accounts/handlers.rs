use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::AccountRequest,
    repo_types::{Account, AccountPatch, NewAccount},
};
use crate::{
    api::{ApiJson, MessageResponse, RecordId},
    auth::AuthIdentity,
    error::{AppError, AppResult, OrInternal},
    state::AppState,
    users::services::{find_user, resolve_user, ProfileHints},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/:id", put(update_account).delete(delete_account))
}

#[instrument(skip(state, identity, body), fields(subject = %identity.subject))]
pub async fn create_account(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    ApiJson(body): ApiJson<AccountRequest>,
) -> AppResult<Json<Account>> {
    let AccountPatch { name, kind } = AccountPatch::from(body);
    let (name, kind) = match (name, kind) {
        (Some(name), Some(kind)) => (name, kind),
        (name, kind) => {
            let mut missing = Vec::new();
            if name.is_none() {
                missing.push("name");
            }
            if kind.is_none() {
                missing.push("type");
            }
            return Err(AppError::MissingRequiredAttribute(missing));
        }
    };

    let user = resolve_user(
        state.store.as_ref(),
        &identity,
        &ProfileHints::default(),
        &state.config.default_currency,
    )
    .await?;

    let account = state
        .store
        .create_account(user.id, NewAccount { name, kind })
        .await
        .or_internal("Failed to create account")?;
    info!(account_id = account.id, user_id = %user.id, "account created");
    Ok(Json(account))
}

#[instrument(skip(state, identity), fields(subject = %identity.subject))]
pub async fn list_accounts(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> AppResult<Json<Vec<Account>>> {
    let Some(user) = find_user(state.store.as_ref(), &identity).await? else {
        return Ok(Json(Vec::new()));
    };
    let accounts = state
        .store
        .list_accounts(user.id)
        .await
        .or_internal("Failed to fetch accounts")?;
    Ok(Json(accounts))
}

#[instrument(skip(state, identity, body), fields(subject = %identity.subject))]
pub async fn update_account(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    RecordId(id): RecordId,
    ApiJson(body): ApiJson<AccountRequest>,
) -> AppResult<Json<MessageResponse>> {
    let user = find_user(state.store.as_ref(), &identity)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    let id = id.ok_or_else(|| AppError::not_found("Account"))?;

    let changed = state
        .store
        .update_account(user.id, id, AccountPatch::from(body))
        .await
        .or_internal("Failed to update account")?;
    if changed == 0 {
        return Err(AppError::not_found("Account"));
    }
    Ok(MessageResponse::new("Account updated"))
}

#[instrument(skip(state, identity), fields(subject = %identity.subject))]
pub async fn delete_account(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    RecordId(id): RecordId,
) -> AppResult<Json<MessageResponse>> {
    let user = find_user(state.store.as_ref(), &identity)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    let id = id.ok_or_else(|| AppError::not_found("Account"))?;

    let removed = state
        .store
        .delete_account(user.id, id)
        .await
        .or_internal("Failed to delete account")?;
    if removed == 0 {
        return Err(AppError::not_found("Account"));
    }
    info!(account_id = id, user_id = %user.id, "account deleted");
    Ok(MessageResponse::new("Account deleted"))
}
