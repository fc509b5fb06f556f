pub mod api;
pub mod events;
pub mod models;

/// Externally authenticated user identity.
pub type UserId = i64;
pub type ChatId = i64;
pub type MessageId = i64;
