use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{parse_occurred_at, TransactionRequest},
    repo_types::{NewTransaction, Transaction, TransactionDetails, TransactionPatch},
};
use crate::{
    api::{ApiJson, MessageResponse, RecordId},
    auth::AuthIdentity,
    categories::services::resolve_category,
    error::{AppError, AppResult, OrInternal},
    state::AppState,
    users::services::{find_user, resolve_user, ProfileHints},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route(
            "/transactions/:id",
            put(update_transaction).delete(delete_transaction),
        )
}

#[instrument(skip(state, identity, body), fields(subject = %identity.subject))]
pub async fn create_transaction(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    ApiJson(body): ApiJson<TransactionRequest>,
) -> AppResult<Json<Transaction>> {
    let body = body.normalized();
    let missing = body.missing_for_create();
    let (Some(kind), Some(category), Some(amount), Some(date), Some(account_id)) = (
        body.kind,
        body.category,
        body.amount,
        body.date,
        body.account_id,
    ) else {
        return Err(AppError::MissingRequiredAttribute(missing));
    };
    let date = parse_occurred_at(&date)?;

    let user = resolve_user(
        state.store.as_ref(),
        &identity,
        &ProfileHints::default(),
        &state.config.default_currency,
    )
    .await?;

    let owns_account = state
        .store
        .owns_account(user.id, account_id)
        .await
        .or_internal("Failed to load account")?;
    if !owns_account {
        return Err(AppError::not_found("Account"));
    }

    let category = resolve_category(state.store.as_ref(), user.id, &category)
        .await
        .or_internal("Failed to resolve category")?;

    let transaction = state
        .store
        .create_transaction(
            user.id,
            NewTransaction {
                account_id,
                category_id: category.id,
                kind,
                amount,
                description: body.description,
                date,
            },
        )
        .await
        .or_internal("Failed to create transaction")?
        .ok_or_else(|| AppError::not_found("Account"))?;

    info!(transaction_id = transaction.id, user_id = %user.id, "transaction created");
    Ok(Json(transaction))
}

#[instrument(skip(state, identity), fields(subject = %identity.subject))]
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> AppResult<Json<Vec<TransactionDetails>>> {
    let Some(user) = find_user(state.store.as_ref(), &identity).await? else {
        return Ok(Json(Vec::new()));
    };
    let transactions = state
        .store
        .list_transactions(user.id)
        .await
        .or_internal("Failed to fetch transactions")?;
    Ok(Json(transactions))
}

#[instrument(skip(state, identity, body), fields(subject = %identity.subject))]
pub async fn update_transaction(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    RecordId(id): RecordId,
    ApiJson(body): ApiJson<TransactionRequest>,
) -> AppResult<Json<MessageResponse>> {
    let body = body.normalized();
    let date = body.date.as_deref().map(parse_occurred_at).transpose()?;

    let user = find_user(state.store.as_ref(), &identity)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    let id = id.ok_or_else(|| AppError::not_found("Transaction"))?;

    if !targets_owned(&state, user.id, id, body.account_id).await? {
        return Err(AppError::not_found("Transaction"));
    }

    let category_id = match body.category.as_deref() {
        Some(name) => Some(
            resolve_category(state.store.as_ref(), user.id, name)
                .await
                .or_internal("Failed to resolve category")?
                .id,
        ),
        None => None,
    };

    let patch = TransactionPatch {
        account_id: body.account_id,
        category_id,
        kind: body.kind,
        amount: body.amount,
        description: body.description,
        date,
    };
    let changed = state
        .store
        .update_transaction(user.id, id, patch)
        .await
        .or_internal("Failed to update transaction")?;
    if changed == 0 {
        return Err(AppError::not_found("Transaction"));
    }
    Ok(MessageResponse::new("Transaction updated"))
}

/// Whether the transaction and any account it is being moved to belong to the caller.
async fn targets_owned(
    state: &AppState,
    user_id: Uuid,
    id: i64,
    account_id: Option<i64>,
) -> AppResult<bool> {
    let owns_transaction = state
        .store
        .owns_transaction(user_id, id)
        .await
        .or_internal("Failed to load transaction")?;
    if !owns_transaction {
        return Ok(false);
    }
    match account_id {
        Some(account_id) => state
            .store
            .owns_account(user_id, account_id)
            .await
            .or_internal("Failed to load account"),
        None => Ok(true),
    }
}

#[instrument(skip(state, identity), fields(subject = %identity.subject))]
pub async fn delete_transaction(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    RecordId(id): RecordId,
) -> AppResult<Json<MessageResponse>> {
    let user = find_user(state.store.as_ref(), &identity)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    let id = id.ok_or_else(|| AppError::not_found("Transaction"))?;

    let removed = state
        .store
        .delete_transaction(user.id, id)
        .await
        .or_internal("Failed to delete transaction")?;
    if removed == 0 {
        return Err(AppError::not_found("Transaction"));
    }
    info!(transaction_id = id, user_id = %user.id, "transaction deleted");
    Ok(MessageResponse::new("Transaction deleted"))
}
