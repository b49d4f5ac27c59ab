use crate::config::{AppConfig, StoreBackend};
use crate::db;
use crate::shell::ViewTable;
use crate::users::{MemoryUserStore, PgUserStore, UserStore};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub views: Arc<ViewTable>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let users = match config.backend {
            StoreBackend::Postgres => {
                let db_config = config
                    .database
                    .as_ref()
                    .context("postgres backend requires database settings")?;
                let db = db::connect(db_config).await?;
                info!("using postgres user store");
                Arc::new(PgUserStore::new(db)) as Arc<dyn UserStore>
            }
            StoreBackend::Memory => {
                warn!("using in-memory user store; data is lost on restart");
                Arc::new(MemoryUserStore::new()) as Arc<dyn UserStore>
            }
        };

        Ok(Self::from_parts(Arc::new(config), users))
    }

    pub fn from_parts(config: Arc<AppConfig>, users: Arc<dyn UserStore>) -> Self {
        Self {
            config,
            users,
            views: Arc::new(ViewTable::admin()),
        }
    }

    /// Empty in-memory state for tests.
    pub fn fake() -> Self {
        Self::from_parts(
            Arc::new(AppConfig::for_tests()),
            Arc::new(MemoryUserStore::new()),
        )
    }
}
