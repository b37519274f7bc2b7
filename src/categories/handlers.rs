use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::{dto::UpdateCategoryRequest, repo_types::Category};
use crate::{
    api::{ApiJson, MessageResponse, RecordId},
    auth::AuthIdentity,
    error::{AppError, AppResult},
    state::AppState,
    store::NameTaken,
    users::services::find_user,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/:id", put(update_category).delete(delete_category))
}

#[instrument(skip(state, identity), fields(subject = %identity.subject))]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> AppResult<Json<Vec<Category>>> {
    let Some(user) = find_user(state.store.as_ref(), &identity).await? else {
        return Ok(Json(Vec::new()));
    };
    let categories = state
        .store
        .list_categories(user.id)
        .await
        .map_err(|e| AppError::internal("Failed to fetch categories", e))?;
    Ok(Json(categories))
}

/// Global categories never match: the owner filter always carries the caller's id.
#[instrument(skip(state, identity, body), fields(subject = %identity.subject))]
pub async fn update_category(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    RecordId(id): RecordId,
    ApiJson(body): ApiJson<UpdateCategoryRequest>,
) -> AppResult<Json<MessageResponse>> {
    let user = find_user(state.store.as_ref(), &identity)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    let id = id.ok_or_else(|| AppError::not_found("Category"))?;

    let changed = match state.store.update_category(user.id, id, body.into()).await {
        Ok(n) => n,
        Err(e) if e.is::<NameTaken>() => {
            return Err(AppError::InvalidAttribute(
                "Category name already in use".into(),
            ))
        }
        Err(e) => return Err(AppError::internal("Failed to update category", e)),
    };
    if changed == 0 {
        return Err(AppError::not_found("Category"));
    }
    Ok(MessageResponse::new("Category updated"))
}

#[instrument(skip(state, identity), fields(subject = %identity.subject))]
pub async fn delete_category(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    RecordId(id): RecordId,
) -> AppResult<Json<MessageResponse>> {
    let user = find_user(state.store.as_ref(), &identity)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    let id = id.ok_or_else(|| AppError::not_found("Category"))?;

    let removed = state
        .store
        .delete_category(user.id, id)
        .await
        .map_err(|e| AppError::internal("Failed to delete category", e))?;
    if removed == 0 {
        return Err(AppError::not_found("Category"));
    }
    info!(category_id = id, user_id = %user.id, "category deleted");
    Ok(MessageResponse::new("Category deleted"))
}
