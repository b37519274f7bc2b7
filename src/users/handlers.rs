use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{SyncRequest, SyncResponse, SyncedUser, UpdateProfileRequest},
    repo_types::{ProfileUpdate, User},
    services::{resolve_user, ProfileHints},
};
use crate::{
    auth::AuthIdentity,
    error::{AppError, AppResult, OrInternal},
    api::{ApiJson, OptionalJson},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/sync", post(sync_user))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/user/profile", get(get_profile).put(update_profile))
        .route("/users", get(list_users))
}

#[instrument(skip(state, identity, body), fields(subject = %identity.subject))]
pub async fn sync_user(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    OptionalJson(body): OptionalJson<SyncRequest>,
) -> AppResult<Json<SyncResponse>> {
    let hints = body.map(ProfileHints::from).unwrap_or_default();
    let user = resolve_user(
        state.store.as_ref(),
        &identity,
        &hints,
        &state.config.default_currency,
    )
    .await?;

    info!(user_id = %user.id, email = %user.email, "user synced");
    Ok(Json(SyncResponse {
        success: true,
        user: SyncedUser {
            id: user.id,
            external_id: user.external_id,
            email: user.email,
            name: user.name,
        },
    }))
}

#[instrument(skip(state, identity), fields(subject = %identity.subject))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> AppResult<Json<User>> {
    let user = resolve_user(
        state.store.as_ref(),
        &identity,
        &ProfileHints::default(),
        &state.config.default_currency,
    )
    .await?;
    Ok(Json(user))
}

fn normalize_currency(raw: &str) -> AppResult<String> {
    let code = raw.trim().to_ascii_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(AppError::InvalidAttribute("Invalid currency".into()))
    }
}

#[instrument(skip(state, identity, body), fields(subject = %identity.subject))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
    ApiJson(body): ApiJson<UpdateProfileRequest>,
) -> AppResult<Json<User>> {
    let currency = body.currency.as_deref().map(normalize_currency).transpose()?;
    let name = body
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let user = resolve_user(
        state.store.as_ref(),
        &identity,
        &ProfileHints::default(),
        &state.config.default_currency,
    )
    .await?;

    let user = state
        .store
        .update_profile(user.id, ProfileUpdate { name, currency })
        .await
        .or_internal("Failed to update user profile")?;
    Ok(Json(user))
}

/// User directory; only callers carrying the configured admin role may read it.
#[instrument(skip(state, identity), fields(subject = %identity.subject))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthIdentity(identity): AuthIdentity,
) -> AppResult<Json<Vec<User>>> {
    if identity.role.as_deref() != Some(state.config.auth.admin_role.as_str()) {
        warn!("user directory requested without admin role");
        return Err(AppError::Forbidden);
    }
    let users = state
        .store
        .list_users()
        .await
        .or_internal("Failed to fetch users")?;
    Ok(Json(users))
}
