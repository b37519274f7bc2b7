use crate::auth::AuthAdapter;
use crate::config::{AppConfig, StoreBackend};
use crate::store::{memory::MemoryStore, PgStore, Store};
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthAdapter>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store = match config.store {
            StoreBackend::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is not set")?;
                Arc::new(PgStore::connect(url).await?) as Arc<dyn Store>
            }
            StoreBackend::Memory => {
                let store = MemoryStore::new();
                store.seed_global_category("Salary", "briefcase", Some("#16A34A")).await;
                store.seed_global_category("Transfer", "repeat", Some("#2563EB")).await;
                store.seed_global_category("Other", "tag", Some("#6B7280")).await;
                Arc::new(store) as Arc<dyn Store>
            }
        };

        let auth = Arc::new(AuthAdapter::from_config(&config.auth)?);
        info!(auth_mode = ?config.auth.mode, store = ?config.store, "state initialised");

        Ok(Self {
            store,
            config,
            auth,
        })
    }
}

#[cfg(test)]
impl AppState {
    pub fn from_parts(store: Arc<dyn Store>, auth: AuthAdapter) -> Self {
        use crate::config::{AuthConfig, AuthMode, MockIdentityConfig, UpstreamConfig};

        let config = Arc::new(AppConfig {
            store: StoreBackend::Memory,
            database_url: None,
            auth: AuthConfig {
                mode: AuthMode::Mock,
                jwt: None,
                remote: None,
                upstream: UpstreamConfig {
                    subject_header: "x-auth-subject".into(),
                    email_header: "x-auth-email".into(),
                },
                mock: MockIdentityConfig {
                    subject: "mock_user".into(),
                    email: None,
                    role: None,
                },
                admin_role: "service_role".into(),
            },
            default_currency: "USD".into(),
        });
        Self {
            store,
            config,
            auth: Arc::new(auth),
        }
    }

    /// Memory-backed state whose every request is the given identity.
    pub fn fake_as(store: Arc<MemoryStore>, identity: crate::auth::Identity) -> Self {
        Self::from_parts(store, AuthAdapter::Mock(identity))
    }

    pub fn fake() -> Self {
        Self::fake_as(
            Arc::new(MemoryStore::new()),
            crate::auth::Identity::new("mock_user").with_email("mock@fintrack.local"),
        )
    }
}
