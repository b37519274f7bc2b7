use std::sync::Arc;

use axum::{async_trait, http::HeaderMap};
use tracing::error;

pub mod extractors;
pub mod identity;
pub mod jwt;
pub mod remote;

pub use extractors::AuthIdentity;
pub use identity::Identity;

use crate::{
    config::{AuthConfig, AuthMode, UpstreamConfig},
    error::AppError,
};

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("invalid or expired token")]
    Rejected,
    #[error(transparent)]
    Fault(#[from] anyhow::Error),
}

/// Turns a bearer credential into an `Identity`.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError>;
}

/// The single identity-attachment contract every route relies on.
pub enum AuthAdapter {
    Bearer(Arc<dyn IdentityVerifier>),
    /// Identity already verified by a trusted gateway and passed in headers.
    Upstream(UpstreamConfig),
    Mock(Identity),
}

impl AuthAdapter {
    pub fn from_config(cfg: &AuthConfig) -> anyhow::Result<Self> {
        let adapter = match cfg.mode {
            AuthMode::Jwt => {
                let jwt = cfg
                    .jwt
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("jwt settings missing"))?;
                Self::Bearer(Arc::new(jwt::JwtVerifier::new(jwt)))
            }
            AuthMode::Remote => {
                let remote = cfg
                    .remote
                    .as_ref()
                    .ok_or_else(|| anyhow::anyhow!("identity service settings missing"))?;
                Self::Bearer(Arc::new(remote::RemoteVerifier::new(remote)?))
            }
            AuthMode::Upstream => Self::Upstream(cfg.upstream.clone()),
            AuthMode::Mock => {
                let mut identity = Identity::new(cfg.mock.subject.clone());
                identity.email = cfg.mock.email.clone();
                identity.role = cfg.mock.role.clone();
                identity.email_verified = identity.email.is_some();
                Self::Mock(identity)
            }
        };
        Ok(adapter)
    }

    pub async fn identify(&self, headers: &HeaderMap) -> Result<Identity, AppError> {
        match self {
            Self::Bearer(verifier) => {
                let token = bearer_token(headers)?;
                match verifier.verify(token).await {
                    Ok(identity) => Ok(identity),
                    Err(VerifyError::Rejected) => Err(AppError::Unauthenticated(
                        "Unauthenticated: Invalid or expired token".into(),
                    )),
                    Err(VerifyError::Fault(e)) => {
                        error!(error = %e, "identity verification failed");
                        Err(AppError::internal(
                            "Internal server error during authentication",
                            e,
                        ))
                    }
                }
            }
            Self::Upstream(cfg) => {
                let subject = header_value(headers, &cfg.subject_header).ok_or_else(|| {
                    AppError::Unauthenticated("Unauthenticated: No verified identity".into())
                })?;
                let mut identity = Identity::new(subject);
                identity.email = header_value(headers, &cfg.email_header);
                Ok(identity)
            }
            Self::Mock(identity) => Ok(identity.clone()),
        }
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Pulls the token out of `Authorization: Bearer <token>`.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let no_token = || AppError::Unauthenticated("Unauthenticated: No token provided".into());
    let auth = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(no_token)?;
    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .ok_or_else(no_token)?
        .trim();
    if token.is_empty() {
        return Err(no_token());
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::AUTHORIZATION, HeaderValue};

    struct FaultyVerifier;

    #[async_trait]
    impl IdentityVerifier for FaultyVerifier {
        async fn verify(&self, _token: &str) -> Result<Identity, VerifyError> {
            Err(anyhow::anyhow!("connection refused").into())
        }
    }

    fn with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(&with_auth("Bearer abc")).unwrap(), "abc");
        assert_eq!(bearer_token(&with_auth("bearer abc")).unwrap(), "abc");
        assert!(bearer_token(&with_auth("Basic abc")).is_err());
        assert!(bearer_token(&with_auth("Bearer   ")).is_err());
        assert!(bearer_token(&HeaderMap::new()).is_err());
    }

    #[tokio::test]
    async fn verifier_fault_is_internal_error() {
        let adapter = AuthAdapter::Bearer(Arc::new(FaultyVerifier));
        let err = adapter.identify(&with_auth("Bearer abc")).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn upstream_requires_subject_header() {
        let adapter = AuthAdapter::Upstream(UpstreamConfig {
            subject_header: "x-auth-subject".into(),
            email_header: "x-auth-email".into(),
        });
        let err = adapter.identify(&HeaderMap::new()).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);

        let mut headers = HeaderMap::new();
        headers.insert("x-auth-subject", HeaderValue::from_static("user_1"));
        headers.insert("x-auth-email", HeaderValue::from_static("u1@example.com"));
        let identity = adapter.identify(&headers).await.unwrap();
        assert_eq!(identity.subject, "user_1");
        assert_eq!(identity.email.as_deref(), Some("u1@example.com"));
    }

    #[tokio::test]
    async fn mock_never_fails() {
        let adapter = AuthAdapter::Mock(Identity::new("mock").with_email("m@example.com"));
        let identity = adapter.identify(&HeaderMap::new()).await.unwrap();
        assert_eq!(identity.subject, "mock");
    }
}
