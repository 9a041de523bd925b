//! HTTP surface:
//! - `GET  /api/tours`       list with query filters
//! - `GET  /api/tours/{id}`  one tour
//! - `GET  /api/meta`        filter vocabulary and bands
//! - `POST /api/bookings`    create a booking
//! - `GET  /api/bookings`    list bookings, newest first
//! - `POST /api/ai/chat`     chat assistant
//! - `GET  /health`          readiness, catalog size, chat mode

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tourbook_agent::AgentRuntime;
use tourbook_core::catalog::Catalog;
use tourbook_core::errors::ApplicationError;
use tourbook_db::{BookingRepository, DbPool};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::{bookings, chat, health, tours};

pub const ROUTE_NOT_FOUND: &str = "Route not found.";

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub bookings: Arc<dyn BookingRepository>,
    pub agent: Arc<AgentRuntime>,
}

pub fn router(state: AppState, db_pool: DbPool) -> Router {
    let health = health::router(db_pool, &state);
    let api = Router::new()
        .route("/api/tours", get(tours::list_tours))
        .route("/api/tours/{id}", get(tours::get_tour))
        .route("/api/meta", get(tours::metadata))
        .route("/api/bookings", post(bookings::create_booking).get(bookings::list_bookings))
        .route("/api/ai/chat", post(chat::chat))
        .with_state(state);

    Router::new()
        .merge(api)
        .merge(health)
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
}

async fn route_not_found() -> ApiError {
    ApplicationError::NotFound(ROUTE_NOT_FOUND.to_owned()).into()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use tourbook_agent::AgentRuntime;
    use tourbook_core::catalog::Catalog;
    use tourbook_db::{
        connect_with_settings, migrations, DbPool, SqlBookingRepository, SqlChatSessionRepository,
    };

    use super::AppState;

    pub async fn state() -> (AppState, DbPool) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let catalog = Catalog::builtin().expect("catalog");
        let sessions = Arc::new(SqlChatSessionRepository::new(pool.clone()));
        let agent = AgentRuntime::new(catalog.clone(), sessions).expect("agent");

        let state = AppState {
            catalog,
            bookings: Arc::new(SqlBookingRepository::new(pool.clone())),
            agent: Arc::new(agent),
        };
        (state, pool)
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{router, test_support::state};

    async fn app() -> (Router, tourbook_db::DbPool) {
        let (state, pool) = state().await;
        (router(state, pool.clone()), pool)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response =
            app.clone().oneshot(builder.body(body).expect("request")).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn not_found_responses_carry_a_correlation_id() {
        let (app, pool) = app().await;

        let request = Request::builder().uri("/api/tours/999").body(Body::empty()).expect("request");
        let response = app.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let correlation_id = response
            .headers()
            .get(crate::error::CORRELATION_HEADER)
            .and_then(|value| value.to_str().ok())
            .expect("correlation header");
        assert!(uuid::Uuid::parse_str(correlation_id).is_ok());

        pool.close().await;
    }

    #[tokio::test]
    async fn unknown_routes_return_json_404() {
        let (app, pool) = app().await;

        let (status, body) = send(&app, Method::GET, "/api/nothing-here", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "message": "Route not found." }));

        pool.close().await;
    }

    #[tokio::test]
    async fn tour_routes_filter_and_resolve() {
        let (app, pool) = app().await;

        let (status, body) =
            send(&app, Method::GET, "/api/tours?location=kenya&minPrice=abc", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["title"], "Safari Adventure Kenya");

        let (status, body) = send(&app, Method::GET, "/api/tours/not-a-number", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Tour not found.");

        let (status, body) = send(&app, Method::GET, "/api/meta", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["durations"][0]["label"], "All Durations");
        assert_eq!(body["priceRanges"][4]["max"], Value::Null);

        pool.close().await;
    }

    #[tokio::test]
    async fn booking_round_trip_over_http() {
        let (app, pool) = app().await;
        let booking = json!({
            "tourId": "5",
            "firstName": "Wangari",
            "lastName": "Maathai",
            "email": "wangari@example.org",
            "phone": "+254 20 000000",
            "date": "2025-08-20",
            "guests": 3
        });

        let (status, body) = send(&app, Method::POST, "/api/bookings", Some(booking)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Booking confirmed.");
        assert_eq!(body["booking"]["totalPrice"], 3799 * 3);
        assert_eq!(body["booking"]["specialRequests"], "");
        assert_eq!(body["booking"]["user"]["firstName"], "Wangari");

        let (status, body) = send(&app, Method::GET, "/api/bookings", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["email"], "wangari@example.org");

        pool.close().await;
    }

    #[tokio::test]
    async fn booking_validation_errors_are_400() {
        let (app, pool) = app().await;

        let (status, body) =
            send(&app, Method::POST, "/api/bookings", Some(json!({ "tourId": 42 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid tour.");

        let (status, body) = send(&app, Method::POST, "/api/bookings", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid tour.");

        pool.close().await;
    }

    #[tokio::test]
    async fn chat_route_validates_and_answers() {
        let (app, pool) = app().await;

        let (status, body) =
            send(&app, Method::POST, "/api/ai/chat", Some(json!({ "message": ["hi"] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Message is required and must be a string");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/ai/chat",
            Some(json!({ "message": "Japan $3000", "context": { "page": "home" } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let ids: Vec<_> = body["tours"].as_array().into_iter().flatten().map(|tour| tour["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(body["context"]["session_id"], "default");

        pool.close().await;
    }

    #[tokio::test]
    async fn health_route_is_mounted() {
        let (app, pool) = app().await;

        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["database"]["reachable"], true);
        assert_eq!(body["chatMode"], "rules");

        pool.close().await;
    }
}
