//! Chat lifecycle, message lifecycle and live fan-out.
//!
//! The store is the source of truth. The [`ConnectionRegistry`] is a
//! best-effort side channel: events reach users who are connected right
//! now and are dropped for everyone else.

pub mod chats;
pub mod error;
pub mod fanout;
pub mod membership;
pub mod messages;
pub mod registry;

#[cfg(test)]
pub(crate) mod testutil;

use std::sync::Arc;

use parley_db::Database;

pub use chats::ChatService;
pub use error::ServiceError;
pub use fanout::FanoutScope;
pub use membership::MembershipResolver;
pub use messages::MessageService;
pub use registry::{Channel, ConnectionRegistry, Delivery};

/// Everything a transport (HTTP or socket) needs, cheap to clone.
#[derive(Clone)]
pub struct Services {
    pub db: Arc<Database>,
    pub registry: ConnectionRegistry,
    pub members: MembershipResolver,
    pub chats: ChatService,
    pub messages: MessageService,
}

impl Services {
    pub fn new(db: Arc<Database>, registry: ConnectionRegistry, scope: FanoutScope) -> Self {
        let members = MembershipResolver::new(db.clone());
        let chats = ChatService::new(db.clone(), registry.clone(), members.clone(), scope);
        let messages = MessageService::new(db.clone(), registry.clone(), members.clone(), scope);
        Self {
            db,
            registry,
            members,
            chats,
            messages,
        }
    }
}

/// Run store work off the async runtime.
pub(crate) async fn blocking<F, T>(db: &Arc<Database>, f: F) -> Result<T, ServiceError>
where
    F: FnOnce(&Database) -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || f(&db))
        .await
        .map_err(|e| ServiceError::Internal(format!("spawn_blocking join error: {}", e)))?
}
