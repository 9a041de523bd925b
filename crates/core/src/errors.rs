use thiserror::Error;

/// Booking validation failures. The display text is sent to clients verbatim.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    #[error("Invalid tour.")]
    InvalidTour,
    #[error("First name and last name are required.")]
    MissingName,
    #[error("Valid email is required.")]
    InvalidEmail,
    #[error("Phone is required.")]
    MissingPhone,
    #[error("Select a valid tour date.")]
    InvalidDate,
    #[error("Guests must be at least 1.")]
    InvalidGuests,
    #[error("Maximum guests for this tour is {max}.")]
    TooManyGuests { max: u32 },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error(transparent)]
    Booking(#[from] BookingError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{0}")]
    NotFound(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("integration failure: {0}")]
    Integration(String),
}

impl From<BookingError> for ApplicationError {
    fn from(value: BookingError) -> Self {
        Self::Domain(DomainError::Booking(value))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

pub const GENERIC_SERVER_ERROR: &str = "Unexpected server error.";

impl InterfaceError {
    /// Text safe to show to API callers. Internal detail stays in the logs.
    pub fn user_message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. } | Self::NotFound { message, .. } => message,
            Self::Internal { .. } => GENERIC_SERVER_ERROR,
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::Internal { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let correlation_id = "unassigned".to_owned();
        match value {
            ApplicationError::Domain(DomainError::Booking(error)) => {
                Self::BadRequest { message: error.to_string(), correlation_id }
            }
            ApplicationError::Persistence(message) | ApplicationError::Integration(message) => {
                Self::Internal { message, correlation_id }
            }
            ApplicationError::NotFound(message) => Self::NotFound { message, correlation_id },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{ApplicationError, BookingError, DomainError, InterfaceError};

    #[test]
    fn booking_error_maps_to_bad_request_with_client_text() {
        let interface =
            ApplicationError::from(BookingError::TooManyGuests { max: 12 }).into_interface("req-1");

        assert!(matches!(
            interface,
            InterfaceError::BadRequest {
                ref correlation_id,
                ..
            } if correlation_id == "req-1"
        ));
        assert_eq!(interface.user_message(), "Maximum guests for this tour is 12.");
    }

    #[test]
    fn not_found_keeps_its_message() {
        let interface =
            ApplicationError::NotFound("Tour not found.".to_owned()).into_interface("req-2");

        assert!(matches!(interface, InterfaceError::NotFound { .. }));
        assert_eq!(interface.user_message(), "Tour not found.");
        assert_eq!(interface.correlation_id(), "req-2");
    }

    #[test]
    fn persistence_error_is_hidden_behind_generic_message() {
        let interface = ApplicationError::Persistence("database lock timeout".to_owned())
            .into_interface("req-3");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.user_message(), "Unexpected server error.");
    }

    #[test]
    fn integration_error_maps_to_internal() {
        let interface = ApplicationError::Integration("llm timed out".to_owned())
            .into_interface("req-4");

        assert!(matches!(interface, InterfaceError::Internal { .. }));
        assert_eq!(interface.correlation_id(), "req-4");
    }

    #[test]
    fn domain_errors_wrap_booking_failures() {
        let error = ApplicationError::from(DomainError::from(BookingError::MissingPhone));
        assert_eq!(error.to_string(), "Phone is required.");
    }

    #[test]
    fn booking_messages_match_client_contract() {
        assert_eq!(BookingError::InvalidTour.to_string(), "Invalid tour.");
        assert_eq!(BookingError::MissingName.to_string(), "First name and last name are required.");
        assert_eq!(BookingError::InvalidEmail.to_string(), "Valid email is required.");
        assert_eq!(BookingError::MissingPhone.to_string(), "Phone is required.");
        assert_eq!(BookingError::InvalidDate.to_string(), "Select a valid tour date.");
        assert_eq!(BookingError::InvalidGuests.to_string(), "Guests must be at least 1.");
    }
}
