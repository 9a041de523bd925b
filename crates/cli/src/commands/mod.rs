pub mod config;
pub mod doctor;
pub mod migrate;
pub mod seed;

use serde::Serialize;
use tokio::runtime::Runtime;
use tourbook_core::catalog::Catalog;
use tourbook_core::config::{AppConfig, LoadOptions};
use tourbook_db::{connect_with_settings, migrations, DbPool};

pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_RUNTIME: u8 = 3;
pub const EXIT_DATABASE: u8 = 4;
pub const EXIT_MIGRATION: u8 = 5;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome<'a> {
    command: &'a str,
    status: &'static str,
    error_class: Option<&'a str>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload =
            CommandOutcome { command, status: "ok", error_class: None, message: message.into() };
        Self { exit_code: 0, output: serialize_payload(&payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command,
            status: "error",
            error_class: Some(error_class),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(&payload) }
    }
}

fn serialize_payload(payload: &CommandOutcome<'_>) -> String {
    serde_json::to_string(payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"{}\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            payload.command,
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// A step that stopped a command, with the exit code it maps to.
#[derive(Debug)]
pub(crate) struct StepFailure {
    pub error_class: &'static str,
    pub message: String,
    pub exit_code: u8,
}

impl StepFailure {
    pub fn into_result(self, command: &str) -> CommandResult {
        CommandResult::failure(command, self.error_class, self.message, self.exit_code)
    }
}

pub(crate) fn load_config() -> Result<AppConfig, StepFailure> {
    AppConfig::load(LoadOptions::default()).map_err(|error| StepFailure {
        error_class: "config_validation",
        message: format!("configuration issue: {error}"),
        exit_code: EXIT_CONFIG,
    })
}

pub(crate) fn load_catalog(config: &AppConfig) -> Result<Catalog, StepFailure> {
    Catalog::load(&config.catalog).map_err(|error| StepFailure {
        error_class: "catalog_load",
        message: format!("tour catalog could not be loaded: {error}"),
        exit_code: EXIT_CONFIG,
    })
}

/// Commands drive async database work from a single-threaded runtime.
pub(crate) fn runtime() -> Result<Runtime, StepFailure> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        StepFailure {
            error_class: "runtime_init",
            message: format!("failed to initialize async runtime: {error}"),
            exit_code: EXIT_RUNTIME,
        }
    })
}

pub(crate) async fn connect(config: &AppConfig) -> Result<DbPool, StepFailure> {
    connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| StepFailure {
        error_class: "db_connectivity",
        message: format!("failed to connect to database: {error}"),
        exit_code: EXIT_DATABASE,
    })
}

pub(crate) async fn migrate(pool: &DbPool) -> Result<(), StepFailure> {
    migrations::run_pending(pool).await.map_err(|error| StepFailure {
        error_class: "migration",
        message: format!("database migration failed: {error}"),
        exit_code: EXIT_MIGRATION,
    })
}
