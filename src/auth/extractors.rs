use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::Identity;
use crate::{error::AppError, state::AppState};

/// Resolves the caller's identity and attaches it to the request extensions.
pub struct AuthIdentity(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AuthIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Identity>() {
            return Ok(AuthIdentity(identity.clone()));
        }
        let identity = state.auth.identify(&parts.headers).await?;
        parts.extensions.insert(identity.clone());
        Ok(AuthIdentity(identity))
    }
}
