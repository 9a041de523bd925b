pub mod booking;
pub mod chat;
pub mod preferences;
pub mod tour;
