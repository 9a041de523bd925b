use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tourbook_core::booking::validate_booking;
use tourbook_core::domain::booking::{Booking, BookingRequest, BookingSummary};
use tourbook_core::errors::ApplicationError;
use tracing::info;

use crate::error::ApiError;
use crate::routes::AppState;

pub const BOOKING_CONFIRMED: &str = "Booking confirmed.";
pub const INVALID_JSON_BODY: &str = "Request body must be valid JSON.";

#[derive(Debug, Serialize)]
pub struct BookingCreated {
    pub message: &'static str,
    pub booking: Booking,
}

pub async fn create_booking(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<BookingCreated>), ApiError> {
    let request = booking_request(&headers, &body)?;

    let draft = validate_booking(&state.catalog, &request).map_err(ApplicationError::from)?;
    let booking = state
        .bookings
        .create(draft)
        .await
        .map_err(|e| ApplicationError::Persistence(e.to_string()))?;

    info!(
        event_name = "booking.created",
        booking_id = booking.id.0,
        user_id = booking.user_id.0,
        tour_id = booking.tour_id.0,
        guests = booking.guests,
        total_price = booking.total_price,
        "booking confirmed"
    );

    Ok((StatusCode::CREATED, Json(BookingCreated { message: BOOKING_CONFIRMED, booking })))
}

/// Reads the submission leniently: anything that is not a JSON object
/// validates as an empty form, and only malformed JSON is rejected outright.
fn booking_request(headers: &HeaderMap, body: &[u8]) -> Result<BookingRequest, ApiError> {
    if !is_json_content_type(headers) || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(BookingRequest::default());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => {
            serde_json::from_value(value).map_err(|_| ApiError::bad_request(INVALID_JSON_BODY))
        }
        Ok(Value::Array(_)) => Ok(BookingRequest::default()),
        Ok(_) | Err(_) => Err(ApiError::bad_request(INVALID_JSON_BODY)),
    }
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let essence = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

pub async fn list_bookings(
    State(state): State<AppState>,
) -> Result<Json<Vec<BookingSummary>>, ApiError> {
    let bookings =
        state.bookings.list().await.map_err(|e| ApplicationError::Persistence(e.to_string()))?;
    Ok(Json(bookings))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Bytes,
        extract::State,
        http::{header, HeaderMap, HeaderValue, StatusCode},
        Json,
    };
    use serde_json::json;
    use tourbook_db::repositories::InMemoryBookingRepository;

    use super::{create_booking, list_bookings, INVALID_JSON_BODY};
    use crate::routes::test_support::state;

    fn json_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    fn body(overrides: serde_json::Value) -> Bytes {
        let mut body = json!({
            "tourId": 1,
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "  Ada@Example.com ",
            "phone": "+44 20 7946 0000",
            "date": "2025-07-20",
            "guests": "2",
            "specialRequests": "vegetarian meals"
        });
        if let (Some(body), Some(overrides)) = (body.as_object_mut(), overrides.as_object()) {
            for (key, value) in overrides {
                body.insert(key.clone(), value.clone());
            }
        }
        Bytes::from(body.to_string())
    }

    #[tokio::test]
    async fn valid_booking_is_created_with_computed_total() {
        let (state, pool) = state().await;

        let (status, Json(created)) =
            create_booking(State(state), json_headers(), body(json!({}))).await.expect("created");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.message, "Booking confirmed.");
        assert_eq!(created.booking.total_price, 4998);
        assert_eq!(created.booking.guests, 2);
        assert_eq!(created.booking.date, "2025-07-20");
        assert_eq!(created.booking.user.email, "ada@example.com");
        assert_eq!(created.booking.tour_title, "Explore the Swiss Alps");

        pool.close().await;
    }

    #[tokio::test]
    async fn group_size_limit_is_reported_verbatim() {
        let (state, pool) = state().await;

        let error = create_booking(State(state), json_headers(), body(json!({ "guests": 13 })))
            .await
            .unwrap_err();

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.0.user_message(), "Maximum guests for this tour is 12.");
        pool.close().await;
    }

    #[tokio::test]
    async fn rebooking_updates_the_same_user() {
        let (state, pool) = state().await;

        let (_, Json(first)) =
            create_booking(State(state.clone()), json_headers(), body(json!({})))
                .await
                .expect("first");
        let (_, Json(second)) = create_booking(
            State(state.clone()),
            json_headers(),
            body(json!({ "email": "ADA@example.com", "phone": "555-0100", "tourId": "5", "date": "2025-07-15" })),
        )
        .await
        .expect("second");

        assert_eq!(first.booking.user_id, second.booking.user_id);
        assert_eq!(second.booking.user.phone, "555-0100");

        let Json(listed) = list_bookings(State(state)).await.expect("list");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.booking.id);
        assert!(listed.iter().all(|booking| booking.phone == "555-0100"));

        pool.close().await;
    }

    #[tokio::test]
    async fn wrongly_typed_fields_get_field_level_messages() {
        let (state, pool) = state().await;
        let cases = [
            (json!({ "tourId": 99, "guests": true }), "Invalid tour."),
            (json!({ "date": 20250720 }), "Select a valid tour date."),
            (json!({ "guests": true }), "Guests must be at least 1."),
            (json!({ "firstName": ["Ada"] }), "First name and last name are required."),
        ];

        for (overrides, expected) in cases {
            let error = create_booking(State(state.clone()), json_headers(), body(overrides))
                .await
                .unwrap_err();
            assert_eq!(error.status(), StatusCode::BAD_REQUEST);
            assert_eq!(error.0.user_message(), expected);
        }

        pool.close().await;
    }

    #[tokio::test]
    async fn numeric_phone_books_successfully() {
        let (state, pool) = state().await;

        let (status, Json(created)) =
            create_booking(State(state), json_headers(), body(json!({ "phone": 5550100 })))
                .await
                .expect("created");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.booking.user.phone, "5550100");
        pool.close().await;
    }

    #[tokio::test]
    async fn empty_or_non_object_bodies_validate_as_empty_forms() {
        let (state, pool) = state().await;
        let mut form_headers = HeaderMap::new();
        form_headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        let cases = [
            (json_headers(), Bytes::new()),
            (json_headers(), Bytes::from_static(b"  \n")),
            (json_headers(), Bytes::from_static(b"[1, 2]")),
            (HeaderMap::new(), Bytes::from_static(b"tourId=1")),
            (form_headers, Bytes::from_static(b"tourId=1&guests=2")),
        ];

        for (headers, payload) in cases {
            let error = create_booking(State(state.clone()), headers, payload).await.unwrap_err();
            assert_eq!(error.0.user_message(), "Invalid tour.");
        }

        pool.close().await;
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let (state, pool) = state().await;

        for payload in [&b"{\"tourId\": 1"[..], &b"\"just a string\""[..], &b"42"[..]] {
            let error = create_booking(State(state.clone()), json_headers(), Bytes::copy_from_slice(payload))
                .await
                .unwrap_err();
            assert_eq!(error.status(), StatusCode::BAD_REQUEST);
            assert_eq!(error.0.user_message(), INVALID_JSON_BODY);
        }

        pool.close().await;
    }

    #[tokio::test]
    async fn vendor_json_content_types_are_parsed() {
        let (state, pool) = state().await;
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/vnd.api+json; charset=utf-8"),
        );

        let (status, _) = create_booking(State(state), headers, body(json!({})))
            .await
            .expect("created");

        assert_eq!(status, StatusCode::CREATED);
        pool.close().await;
    }

    #[tokio::test]
    async fn bookings_work_against_the_in_memory_repository() {
        let (state, pool) = state().await;
        let state = crate::routes::AppState {
            bookings: Arc::new(InMemoryBookingRepository::default()),
            ..state
        };

        let (_, Json(created)) =
            create_booking(State(state.clone()), json_headers(), body(json!({})))
                .await
                .expect("created");
        let Json(listed) = list_bookings(State(state)).await.expect("list");

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, created.booking.id);
        assert_eq!(listed[0].email, "ada@example.com");
        pool.close().await;
    }
}
