use std::sync::Arc;
use std::time::Duration;

use parley_db::{Database, chats, memberships, users};
use parley_types::events::ServerEvent;
use parley_types::{ChatId, UserId};
use tokio::sync::mpsc;

use crate::{Channel, ConnectionRegistry, FanoutScope, Services};

pub fn services(scope: FanoutScope) -> Services {
    let db = Arc::new(Database::open_in_memory().unwrap());
    Services::new(db, ConnectionRegistry::new(Duration::from_millis(100)), scope)
}

/// Register a fresh channel for `user_id` and hand back its receiving end.
pub fn connect(registry: &ConnectionRegistry, user_id: UserId) -> mpsc::Receiver<ServerEvent> {
    let (channel, rx) = Channel::new(32);
    registry.register(user_id, channel);
    rx
}

pub fn add_user(db: &Database, login: &str) -> UserId {
    db.with_conn(|conn| users::insert(conn, login, "hash")).unwrap()
}

/// A chat whose only member is its creator.
pub fn seed_chat(db: &Database, creator_id: UserId) -> ChatId {
    db.with_tx(|tx| {
        let id = chats::insert(tx, "seed", creator_id, false, &parley_db::now())?;
        memberships::insert_if_absent(tx, id, creator_id, &parley_db::now())?;
        Ok(id)
    })
    .unwrap()
}

/// A chat row with no membership at all.
pub fn seed_orphan_chat(db: &Database, creator_id: UserId) -> ChatId {
    db.with_conn(|conn| chats::insert(conn, "orphan", creator_id, false, &parley_db::now()))
        .unwrap()
}

pub fn drain(rx: &mut mpsc::Receiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
