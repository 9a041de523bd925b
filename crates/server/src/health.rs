use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tourbook_db::DbPool;
use tracing::warn;

use crate::routes::AppState;

#[derive(Clone)]
struct HealthState {
    db_pool: DbPool,
    catalog_tours: usize,
    chat_mode: &'static str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    Ready,
    Degraded,
}

/// Readiness of the booking store. `error` carries the driver message when
/// `SELECT 1` fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DatabaseHealth {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: Readiness,
    pub database: DatabaseHealth,
    pub catalog_tours: usize,
    pub chat_mode: &'static str,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool, app: &AppState) -> Router {
    let state = HealthState {
        db_pool,
        catalog_tours: app.catalog.len(),
        chat_mode: app.agent.mode().as_str(),
    };
    Router::new().route("/health", get(health)).with_state(state)
}

async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthReport>) {
    let database = ping(&state.db_pool).await;
    let status = if database.reachable { Readiness::Ready } else { Readiness::Degraded };

    let report = HealthReport {
        status,
        database,
        catalog_tours: state.catalog_tours,
        chat_mode: state.chat_mode,
        checked_at: tourbook_db::timestamp_now(),
    };

    let code = match status {
        Readiness::Ready => StatusCode::OK,
        Readiness::Degraded => StatusCode::SERVICE_UNAVAILABLE,
    };
    (code, Json(report))
}

async fn ping(pool: &DbPool) -> DatabaseHealth {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => DatabaseHealth { reachable: true, error: None },
        Err(error) => {
            warn!(event_name = "health.database_unreachable", error = %error, "health check failed");
            DatabaseHealth { reachable: false, error: Some(error.to_string()) }
        }
    }
}
