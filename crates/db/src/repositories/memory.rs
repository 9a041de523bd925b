use std::collections::HashMap;

use tokio::sync::RwLock;

use tourbook_core::domain::booking::{
    Booking, BookingContact, BookingDraft, BookingId, BookingSummary, UserId,
};
use tourbook_core::domain::chat::{ChatRole, ChatSession, ChatTurn};
use tourbook_core::domain::preferences::Preferences;

use super::{BookingRepository, ChatSessionRepository, RepositoryError};
use crate::timestamp_now;

#[derive(Default)]
struct BookingStore {
    users: Vec<BookingContact>,
    bookings: Vec<Booking>,
}

#[derive(Default)]
pub struct InMemoryBookingRepository {
    store: RwLock<BookingStore>,
}

#[async_trait::async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn create(&self, draft: BookingDraft) -> Result<Booking, RepositoryError> {
        let mut store = self.store.write().await;
        let next_user_id = store.users.len() as i64 + 1;

        let user = match store.users.iter_mut().find(|user| user.email == draft.email) {
            Some(user) => {
                user.first_name = draft.first_name.clone();
                user.last_name = draft.last_name.clone();
                user.phone = draft.phone.clone();
                user.clone()
            }
            None => {
                let user = BookingContact {
                    id: UserId(next_user_id),
                    first_name: draft.first_name.clone(),
                    last_name: draft.last_name.clone(),
                    email: draft.email.clone(),
                    phone: draft.phone.clone(),
                };
                store.users.push(user.clone());
                user
            }
        };

        let booking = Booking {
            id: BookingId(store.bookings.len() as i64 + 1),
            user_id: user.id,
            tour_id: draft.tour_id,
            tour_title: draft.tour_title,
            date: draft.date,
            guests: draft.guests,
            special_requests: draft.special_requests,
            total_price: draft.total_price,
            created_at: timestamp_now(),
            user,
        };
        store.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn list(&self) -> Result<Vec<BookingSummary>, RepositoryError> {
        let store = self.store.read().await;
        let users: HashMap<UserId, &BookingContact> =
            store.users.iter().map(|user| (user.id, user)).collect();

        Ok(store
            .bookings
            .iter()
            .rev()
            .map(|booking| {
                let mut booking = booking.clone();
                if let Some(user) = users.get(&booking.user_id) {
                    booking.user = (*user).clone();
                }
                BookingSummary::from(booking)
            })
            .collect())
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<BookingContact>, RepositoryError> {
        let store = self.store.read().await;
        Ok(store.users.iter().find(|user| user.email == email).cloned())
    }

    async fn count_users(&self) -> Result<i64, RepositoryError> {
        Ok(self.store.read().await.users.len() as i64)
    }
}

#[derive(Default)]
pub struct InMemoryChatSessionRepository {
    sessions: RwLock<HashMap<String, (ChatSession, Vec<ChatTurn>)>>,
}

impl InMemoryChatSessionRepository {
    fn merge_entry<'a>(
        sessions: &'a mut HashMap<String, (ChatSession, Vec<ChatTurn>)>,
        session_id: &str,
        preferences: &Preferences,
        now: &str,
    ) -> &'a mut (ChatSession, Vec<ChatTurn>) {
        let entry = sessions.entry(session_id.to_owned()).or_insert_with(|| {
            (
                ChatSession {
                    id: session_id.to_owned(),
                    preferences: Preferences::default(),
                    created_at: now.to_owned(),
                    updated_at: now.to_owned(),
                },
                Vec::new(),
            )
        });
        entry.0.preferences.merge(preferences);
        entry.0.updated_at = now.to_owned();
        entry
    }
}

#[async_trait::async_trait]
impl ChatSessionRepository for InMemoryChatSessionRepository {
    async fn load(&self, session_id: &str) -> Result<Option<ChatSession>, RepositoryError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id).map(|(session, _)| session.clone()))
    }

    async fn save_preferences(
        &self,
        session_id: &str,
        preferences: &Preferences,
    ) -> Result<Preferences, RepositoryError> {
        let now = timestamp_now();
        let mut sessions = self.sessions.write().await;
        let entry = Self::merge_entry(&mut sessions, session_id, preferences, &now);
        Ok(entry.0.preferences.clone())
    }

    async fn record_exchange(
        &self,
        session_id: &str,
        preferences: &Preferences,
        user_message: &str,
        assistant_message: &str,
    ) -> Result<ChatSession, RepositoryError> {
        let now = timestamp_now();
        let mut sessions = self.sessions.write().await;
        let entry = Self::merge_entry(&mut sessions, session_id, preferences, &now);
        for (role, message) in
            [(ChatRole::User, user_message), (ChatRole::Assistant, assistant_message)]
        {
            entry.1.push(ChatTurn { role, message: message.to_owned(), created_at: now.clone() });
        }
        Ok(entry.0.clone())
    }

    async fn history(
        &self,
        session_id: &str,
        limit: u32,
    ) -> Result<Vec<ChatTurn>, RepositoryError> {
        let sessions = self.sessions.read().await;
        let turns = sessions.get(session_id).map(|(_, turns)| turns.as_slice()).unwrap_or(&[]);
        let skip = turns.len().saturating_sub(limit as usize);
        Ok(turns[skip..].to_vec())
    }
}
