use async_trait::async_trait;
use thiserror::Error;

use tourbook_core::domain::booking::{Booking, BookingContact, BookingDraft, BookingSummary};
use tourbook_core::domain::chat::{ChatSession, ChatTurn};
use tourbook_core::domain::preferences::Preferences;

pub mod booking;
pub mod chat_session;
pub mod memory;

pub use booking::SqlBookingRepository;
pub use chat_session::SqlChatSessionRepository;
pub use memory::{InMemoryBookingRepository, InMemoryChatSessionRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Upserts the user by email and appends the booking as one unit.
    async fn create(&self, draft: BookingDraft) -> Result<Booking, RepositoryError>;

    /// All bookings joined with their user, newest first.
    async fn list(&self) -> Result<Vec<BookingSummary>, RepositoryError>;

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<BookingContact>, RepositoryError>;

    async fn count_users(&self) -> Result<i64, RepositoryError>;
}

#[async_trait]
pub trait ChatSessionRepository: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<ChatSession>, RepositoryError>;

    /// Merges `preferences` into the stored ones, creating the session if needed,
    /// and returns the merged result.
    async fn save_preferences(
        &self,
        session_id: &str,
        preferences: &Preferences,
    ) -> Result<Preferences, RepositoryError>;

    /// Appends one user turn and one assistant turn and merges the preferences
    /// extracted from the user turn.
    async fn record_exchange(
        &self,
        session_id: &str,
        preferences: &Preferences,
        user_message: &str,
        assistant_message: &str,
    ) -> Result<ChatSession, RepositoryError>;

    /// Most recent turns, oldest first.
    async fn history(&self, session_id: &str, limit: u32)
        -> Result<Vec<ChatTurn>, RepositoryError>;
}
