use std::time::Duration;

use anyhow::Context;
use axum::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{
    identity::{metadata_name, Identity},
    IdentityVerifier, VerifyError,
};
use crate::config::RemoteAuthConfig;

/// User object returned by the identity service's `/auth/v1/user` endpoint.
#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_confirmed_at: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    user_metadata: Option<serde_json::Value>,
}

impl From<RemoteUser> for Identity {
    fn from(u: RemoteUser) -> Self {
        let name = u.user_metadata.as_ref().and_then(metadata_name);
        Identity {
            subject: u.id,
            email: u.email.filter(|e| !e.trim().is_empty()),
            name,
            email_verified: u.email_confirmed_at.is_some(),
            role: u.role,
        }
    }
}

/// Hands the bearer token to the identity service and trusts its answer.
#[derive(Clone)]
pub struct RemoteVerifier {
    client: reqwest::Client,
    user_url: String,
    api_key: String,
}

impl RemoteVerifier {
    pub fn new(cfg: &RemoteAuthConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build identity service client")?;
        Ok(Self {
            client,
            user_url: format!("{}/auth/v1/user", cfg.base_url.trim_end_matches('/')),
            api_key: cfg.api_key.clone(),
        })
    }
}

#[async_trait]
impl IdentityVerifier for RemoteVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        let res = self
            .client
            .get(&self.user_url)
            .bearer_auth(token)
            .header("apikey", &self.api_key)
            .send()
            .await
            .context("identity service request")?;

        let status = res.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!(%status, "bearer credential rejected");
            return Err(VerifyError::Rejected);
        }
        if !status.is_success() {
            return Err(anyhow::anyhow!("identity service returned {status}").into());
        }

        let user: RemoteUser = res.json().await.context("decode identity service user")?;
        let identity = Identity::from(user);
        debug!(subject = %identity.subject, "remote identity verified");
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, routing::get, Json, Router};
    use serde_json::json;

    /// Serves `app` on an ephemeral local port and returns a verifier pointed at it.
    async fn verifier_for(app: Router) -> RemoteVerifier {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        RemoteVerifier::new(&RemoteAuthConfig {
            base_url: format!("http://{addr}"),
            api_key: "anon-key".into(),
        })
        .unwrap()
    }

    fn answering(status: axum::http::StatusCode) -> Router {
        Router::new().route("/auth/v1/user", get(move || async move { status }))
    }

    #[tokio::test]
    async fn unauthorized_and_forbidden_are_rejections() {
        for status in [
            axum::http::StatusCode::UNAUTHORIZED,
            axum::http::StatusCode::FORBIDDEN,
        ] {
            let verifier = verifier_for(answering(status)).await;
            let err = verifier.verify("stale").await.unwrap_err();
            assert!(matches!(err, VerifyError::Rejected), "{status}: {err:?}");
        }
    }

    #[tokio::test]
    async fn server_error_is_a_fault() {
        let verifier = verifier_for(answering(axum::http::StatusCode::INTERNAL_SERVER_ERROR)).await;
        let err = verifier.verify("token").await.unwrap_err();
        assert!(matches!(err, VerifyError::Fault(_)));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_fault() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let verifier = RemoteVerifier::new(&RemoteAuthConfig {
            base_url: format!("http://{addr}"),
            api_key: "anon-key".into(),
        })
        .unwrap();
        let err = verifier.verify("token").await.unwrap_err();
        assert!(matches!(err, VerifyError::Fault(_)));
    }

    #[tokio::test]
    async fn accepted_token_yields_identity() {
        let app = Router::new().route(
            "/auth/v1/user",
            get(|headers: HeaderMap| async move {
                let authorized = headers
                    .get("authorization")
                    .is_some_and(|v| v == "Bearer good-token");
                let keyed = headers.get("apikey").is_some_and(|v| v == "anon-key");
                if !(authorized && keyed) {
                    return Err(axum::http::StatusCode::UNAUTHORIZED);
                }
                Ok(Json(json!({
                    "id": "user-42",
                    "email": "grace@example.com",
                    "email_confirmed_at": "2024-01-01T00:00:00Z",
                    "role": "authenticated",
                    "user_metadata": { "full_name": "Grace Hopper" }
                })))
            }),
        );
        let verifier = verifier_for(app).await;

        let identity = verifier.verify("good-token").await.unwrap();
        assert_eq!(identity.subject, "user-42");
        assert_eq!(identity.email.as_deref(), Some("grace@example.com"));
        assert_eq!(identity.name.as_deref(), Some("Grace Hopper"));
        assert_eq!(identity.role.as_deref(), Some("authenticated"));
        assert!(identity.email_verified);

        let err = verifier.verify("other-token").await.unwrap_err();
        assert!(matches!(err, VerifyError::Rejected));
    }

    #[test]
    fn maps_remote_user() {
        let user: RemoteUser = serde_json::from_value(json!({
            "id": "8d5c7a1e-0000-4000-8000-000000000001",
            "aud": "authenticated",
            "email": "ada@example.com",
            "email_confirmed_at": "2024-01-01T00:00:00Z",
            "role": "authenticated",
            "user_metadata": { "name": "Ada" }
        }))
        .unwrap();
        let identity = Identity::from(user);
        assert_eq!(identity.subject, "8d5c7a1e-0000-4000-8000-000000000001");
        assert_eq!(identity.email.as_deref(), Some("ada@example.com"));
        assert_eq!(identity.name.as_deref(), Some("Ada"));
        assert!(identity.email_verified);
    }

    #[test]
    fn unconfirmed_user_without_metadata() {
        let user: RemoteUser = serde_json::from_value(json!({ "id": "abc" })).unwrap();
        let identity = Identity::from(user);
        assert_eq!(identity.email, None);
        assert_eq!(identity.name, None);
        assert!(!identity.email_verified);
    }

    #[test]
    fn builds_user_url() {
        let v = RemoteVerifier::new(&RemoteAuthConfig {
            base_url: "https://id.example.com/".into(),
            api_key: "anon".into(),
        })
        .unwrap();
        assert_eq!(v.user_url, "https://id.example.com/auth/v1/user");
    }
}
