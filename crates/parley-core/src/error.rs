use parley_types::{ChatId, MessageId};

/// Failures a caller of a service can see.
///
/// Delivery problems never show up here; the registry logs them and
/// evicts the dead channel.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("store error: {0}")]
    Store(parley_db::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn chat_not_found(id: ChatId) -> Self {
        Self::NotFound(format!("chat {}", id))
    }

    pub fn message_not_found(id: MessageId) -> Self {
        Self::NotFound(format!("message {}", id))
    }
}

impl From<parley_db::Error> for ServiceError {
    fn from(err: parley_db::Error) -> Self {
        match err {
            parley_db::Error::Conflict(msg) => Self::Conflict(msg),
            other => Self::Store(other),
        }
    }
}
