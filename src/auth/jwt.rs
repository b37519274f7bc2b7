use axum::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{
    identity::{metadata_name, Identity},
    IdentityVerifier, VerifyError,
};
use crate::config::JwtConfig;

/// Claims we read out of a provider-issued access token.
#[derive(Debug, Deserialize)]
struct TokenClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    user_metadata: Option<serde_json::Value>,
}

impl From<TokenClaims> for Identity {
    fn from(c: TokenClaims) -> Self {
        let meta = c.user_metadata.unwrap_or(serde_json::Value::Null);
        let email_verified = c
            .email_verified
            .or_else(|| meta.get("email_verified").and_then(|v| v.as_bool()))
            .unwrap_or(false);
        Identity {
            subject: c.sub,
            email: c.email.filter(|e| !e.trim().is_empty()),
            name: c.name.or_else(|| metadata_name(&meta)),
            email_verified,
            role: c.role,
        }
    }
}

/// Verifies HS256 tokens signed with the identity service's shared secret.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(cfg: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match &cfg.audience {
            Some(aud) => validation.set_audience(std::slice::from_ref(aud)),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &cfg.issuer {
            validation.set_issuer(std::slice::from_ref(iss));
        }
        Self {
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            validation,
        }
    }

    pub fn decode(&self, token: &str) -> anyhow::Result<Identity> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation)?;
        let identity = Identity::from(data.claims);
        debug!(subject = %identity.subject, "jwt verified");
        Ok(identity)
    }
}

#[async_trait]
impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, VerifyError> {
        self.decode(token).map_err(|e| {
            warn!(reason = %e, "bearer credential rejected");
            VerifyError::Rejected
        })
    }
}
