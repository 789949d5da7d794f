use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::jwt::TokenService;
use crate::config::AppConfig;
use crate::db::PgStore;
use crate::error::{AppError, AppResult};
use crate::storage::Store;

pub const DB_NOT_CONFIGURED: &str = "Database not configured. Set DATABASE_URL";

#[derive(Clone)]
pub struct AppState {
    /// `None` when no database is configured.
    pub store: Option<Arc<dyn Store>>,
    pub tokens: TokenService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let tokens = TokenService::from_config(&config.jwt)?;

        let store = match config.database_url.as_deref() {
            Some(url) => {
                let pg = PgStore::connect_lazy(url, &config)?;
                // Run migrations if the database is reachable
                if let Err(e) = pg.migrate().await {
                    warn!(error = %e, "migration failed; continuing");
                } else {
                    info!("database schema up to date");
                }
                Some(Arc::new(pg) as Arc<dyn Store>)
            }
            None => {
                warn!("DATABASE_URL not set; running without a database");
                None
            }
        };

        Ok(Self::from_parts(store, tokens, Arc::new(config)))
    }

    pub fn from_parts(
        store: Option<Arc<dyn Store>>,
        tokens: TokenService,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            tokens,
            config,
        }
    }

    /// The configured store, or `Unavailable` in degraded mode.
    pub fn store(&self) -> AppResult<&dyn Store> {
        self.store
            .as_deref()
            .ok_or_else(|| AppError::Unavailable(DB_NOT_CONFIGURED.into()))
    }
}

#[cfg(test)]
impl AppState {
    pub fn test_config() -> AppConfig {
        AppConfig {
            database_url: None,
            db_max_connections: 1,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                algorithm: "HS256".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                default_ttl_minutes: 15,
                access_ttl_minutes: 30,
            },
            host: "127.0.0.1".into(),
            port: 0,
        }
    }

    /// State backed by a fresh in-memory store.
    pub fn fake() -> Self {
        let store = Arc::new(crate::memory::MemoryStore::new()) as Arc<dyn Store>;
        Self::with_store(Some(store))
    }

    pub fn degraded() -> Self {
        Self::with_store(None)
    }

    pub fn with_store(store: Option<Arc<dyn Store>>) -> Self {
        let config = Self::test_config();
        let tokens = TokenService::from_config(&config.jwt).expect("test jwt config");
        Self::from_parts(store, tokens, Arc::new(config))
    }
}
