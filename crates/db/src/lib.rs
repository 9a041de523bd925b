pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{DemoBookingDataset, SeedResult};
pub use repositories::{
    BookingRepository, ChatSessionRepository, InMemoryBookingRepository,
    InMemoryChatSessionRepository, RepositoryError, SqlBookingRepository,
    SqlChatSessionRepository,
};

/// RFC 3339 UTC timestamp with millisecond precision, as stored in every `created_at` column.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
