use std::sync::Arc;

use thiserror::Error;
use tourbook_agent::{AgentError, AgentRuntime};
use tourbook_core::catalog::{Catalog, CatalogError};
use tourbook_core::config::{AppConfig, ConfigError, LoadOptions};
use tourbook_db::{
    connect_with_settings, migrations, DbPool, SqlBookingRepository, SqlChatSessionRepository,
};
use tracing::info;

use crate::routes::AppState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub catalog: Catalog,
    pub agent: Arc<AgentRuntime>,
}

impl Application {
    pub fn state(&self) -> AppState {
        AppState {
            catalog: self.catalog.clone(),
            bookings: Arc::new(SqlBookingRepository::new(self.db_pool.clone())),
            agent: Arc::clone(&self.agent),
        }
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("tour catalog could not be loaded: {0}")]
    Catalog(#[from] CatalogError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("chat assistant could not start: {0}")]
    Agent(#[from] AgentError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let catalog = Catalog::load(&config.catalog)?;
    let catalog_source = match &config.catalog.path {
        Some(path) => path.display().to_string(),
        None => "builtin".to_string(),
    };
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        tour_count = catalog.len(),
        source = %catalog_source,
        "tour catalog loaded"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let sessions = Arc::new(SqlChatSessionRepository::new(db_pool.clone()));
    let agent = AgentRuntime::from_config(catalog.clone(), sessions, &config.llm)?;
    info!(
        event_name = "system.bootstrap.agent_ready",
        correlation_id = "bootstrap",
        mode = agent.mode().as_str(),
        "chat assistant ready"
    );

    Ok(Application { config, db_pool, catalog, agent: Arc::new(agent) })
}
