use std::collections::BTreeSet;
use std::sync::Arc;

use parley_db::{Database, chats, memberships};
use parley_types::{ChatId, UserId};

use crate::{ServiceError, blocking};

/// Answers "who is in this chat" from the store.
#[derive(Clone)]
pub struct MembershipResolver {
    db: Arc<Database>,
}

impl MembershipResolver {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Current members of `chat_id`. Fails with `NotFound` for an unknown chat.
    pub async fn members_of(&self, chat_id: ChatId) -> Result<BTreeSet<UserId>, ServiceError> {
        blocking(&self.db, move |db| {
            db.with_conn(|conn| {
                if !chats::exists(conn, chat_id)? {
                    return Ok(None);
                }
                memberships::list_user_ids(conn, chat_id).map(Some)
            })?
            .ok_or_else(|| ServiceError::chat_not_found(chat_id))
        })
        .await
    }

    /// Add `user_id` to `chat_id`. Adding an existing member is a no-op;
    /// returns whether a new membership was written.
    pub async fn add_member(&self, chat_id: ChatId, user_id: UserId) -> Result<bool, ServiceError> {
        blocking(&self.db, move |db| {
            db.with_tx(|tx| {
                if !chats::exists(tx, chat_id)? {
                    return Ok(None);
                }
                memberships::insert_if_absent(tx, chat_id, user_id, &parley_db::now()).map(Some)
            })?
            .ok_or_else(|| ServiceError::chat_not_found(chat_id))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::seed_chat;

    #[tokio::test]
    async fn members_of_unknown_chat_is_not_found() {
        let resolver = MembershipResolver::new(Arc::new(Database::open_in_memory().unwrap()));
        let err = resolver.members_of(99).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn add_member_is_idempotent() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let chat_id = seed_chat(&db, 1);
        let resolver = MembershipResolver::new(db);

        assert!(resolver.add_member(chat_id, 2).await.unwrap());
        assert!(!resolver.add_member(chat_id, 2).await.unwrap());

        let members = resolver.members_of(chat_id).await.unwrap();
        assert_eq!(members.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn add_member_to_unknown_chat_is_not_found() {
        let resolver = MembershipResolver::new(Arc::new(Database::open_in_memory().unwrap()));
        assert!(matches!(
            resolver.add_member(5, 1).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
