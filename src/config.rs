use anyhow::Context;
use serde::Deserialize;

/// Which identity verifier fronts the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    Jwt,
    Remote,
    Upstream,
    Mock,
}

impl std::str::FromStr for AuthMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jwt" => Ok(Self::Jwt),
            "remote" => Ok(Self::Remote),
            "upstream" => Ok(Self::Upstream),
            "mock" => Ok(Self::Mock),
            other => anyhow::bail!("unknown AUTH_MODE: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteAuthConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub subject_header: String,
    pub email_header: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MockIdentityConfig {
    pub subject: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub mode: AuthMode,
    pub jwt: Option<JwtConfig>,
    pub remote: Option<RemoteAuthConfig>,
    pub upstream: UpstreamConfig,
    pub mock: MockIdentityConfig,
    pub admin_role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub auth: AuthConfig,
    pub default_currency: String,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match env_opt("STORE_BACKEND").as_deref() {
            None | Some("postgres") => StoreBackend::Postgres,
            Some("memory") => StoreBackend::Memory,
            Some(other) => anyhow::bail!("unknown STORE_BACKEND: {other}"),
        };
        let database_url = env_opt("DATABASE_URL");
        if store == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required for the postgres store");
        }

        let mode: AuthMode = env_opt("AUTH_MODE")
            .unwrap_or_else(|| "jwt".into())
            .parse()?;

        let jwt = match env_opt("JWT_SECRET") {
            Some(secret) => Some(JwtConfig {
                secret,
                issuer: env_opt("JWT_ISSUER"),
                audience: env_opt("JWT_AUDIENCE"),
            }),
            None => None,
        };
        if mode == AuthMode::Jwt && jwt.is_none() {
            anyhow::bail!("JWT_SECRET is required when AUTH_MODE=jwt");
        }

        let remote = match (env_opt("AUTH_SERVICE_URL"), env_opt("AUTH_SERVICE_KEY")) {
            (Some(base_url), Some(api_key)) => Some(RemoteAuthConfig { base_url, api_key }),
            _ => None,
        };
        if mode == AuthMode::Remote && remote.is_none() {
            return Err(anyhow::anyhow!("missing identity service settings"))
                .context("AUTH_SERVICE_URL and AUTH_SERVICE_KEY are required when AUTH_MODE=remote");
        }

        let auth = AuthConfig {
            mode,
            jwt,
            remote,
            upstream: UpstreamConfig {
                subject_header: env_opt("UPSTREAM_SUBJECT_HEADER")
                    .unwrap_or_else(|| "x-auth-subject".into()),
                email_header: env_opt("UPSTREAM_EMAIL_HEADER")
                    .unwrap_or_else(|| "x-auth-email".into()),
            },
            mock: MockIdentityConfig {
                subject: env_opt("MOCK_SUBJECT").unwrap_or_else(|| "mock_user".into()),
                email: env_opt("MOCK_EMAIL").or_else(|| Some("mock@fintrack.local".into())),
                role: env_opt("MOCK_ROLE"),
            },
            admin_role: env_opt("ADMIN_ROLE").unwrap_or_else(|| "service_role".into()),
        };

        Ok(Self {
            store,
            database_url,
            auth,
            default_currency: env_opt("DEFAULT_CURRENCY").unwrap_or_else(|| "USD".into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_auth_modes() {
        assert_eq!("jwt".parse::<AuthMode>().unwrap(), AuthMode::Jwt);
        assert_eq!(" Remote ".parse::<AuthMode>().unwrap(), AuthMode::Remote);
        assert_eq!("upstream".parse::<AuthMode>().unwrap(), AuthMode::Upstream);
        assert_eq!("MOCK".parse::<AuthMode>().unwrap(), AuthMode::Mock);
        assert!("clerk".parse::<AuthMode>().is_err());
    }
}
