pub mod booking;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;

pub use booking::{normalize_email, validate_booking};
pub use catalog::{Catalog, CatalogError, CatalogMetadata, TourQuery};
pub use domain::booking::{
    Booking, BookingContact, BookingDraft, BookingId, BookingRequest, BookingSummary,
    FormField, LooseInteger, UserId,
};
pub use domain::chat::{ChatRole, ChatSession, ChatTurn, DEFAULT_SESSION_ID};
pub use domain::preferences::Preferences;
pub use domain::tour::{Tour, TourId};
pub use errors::{ApplicationError, BookingError, DomainError, InterfaceError};
