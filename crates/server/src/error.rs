use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tourbook_core::errors::{ApplicationError, InterfaceError};
use tracing::{error, warn};
use uuid::Uuid;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

/// HTTP-facing error. Wraps the interface taxonomy so every failure carries a
/// correlation id that also lands in the logs.
#[derive(Debug)]
pub struct ApiError(pub InterfaceError);

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(InterfaceError::BadRequest { message: message.into(), correlation_id: new_correlation_id() })
    }

    pub fn status(&self) -> StatusCode {
        match self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(value: ApplicationError) -> Self {
        Self(value.into_interface(new_correlation_id()))
    }
}

fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let correlation_id = self.0.correlation_id().to_owned();

        match &self.0 {
            InterfaceError::Internal { message, .. } => error!(
                event_name = "http.request.failed",
                correlation_id = %correlation_id,
                error = %message,
                "request failed with internal error"
            ),
            InterfaceError::BadRequest { message, .. } => warn!(
                event_name = "http.request.rejected",
                correlation_id = %correlation_id,
                reason = %message,
                "request rejected"
            ),
            InterfaceError::NotFound { .. } => {}
        }

        let mut response =
            (status, Json(ErrorBody { message: self.0.user_message().to_owned() })).into_response();
        if let Ok(value) = HeaderValue::from_str(&correlation_id) {
            response.headers_mut().insert(CORRELATION_HEADER, value);
        }
        response
    }
}
