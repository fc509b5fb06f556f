use std::collections::BTreeSet;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{info, warn};

use parley_db::{Database, chats, memberships};
use parley_types::events::ServerEvent;
use parley_types::models::{Chat, ChatSummary};
use parley_types::{ChatId, UserId};

use crate::fanout::FanoutScope;
use crate::membership::MembershipResolver;
use crate::registry::ConnectionRegistry;
use crate::{ServiceError, blocking};

/// Chat lifecycle: create, rename / re-avatar, list.
#[derive(Clone)]
pub struct ChatService {
    db: Arc<Database>,
    registry: ConnectionRegistry,
    members: MembershipResolver,
    scope: FanoutScope,
}

impl ChatService {
    pub fn new(
        db: Arc<Database>,
        registry: ConnectionRegistry,
        members: MembershipResolver,
        scope: FanoutScope,
    ) -> Self {
        Self {
            db,
            registry,
            members,
            scope,
        }
    }

    /// Create a chat owned by `creator_id` with the given participants.
    ///
    /// The creator is always a member; duplicates and the creator's own id
    /// in `participant_ids` are ignored. The chat row and every membership
    /// are written in one transaction. Afterwards each member who is online
    /// receives their own refreshed `chats_update`.
    pub async fn create_chat(
        &self,
        name: &str,
        creator_id: UserId,
        is_group: bool,
        participant_ids: &[UserId],
    ) -> Result<ChatId, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::Validation("chat name must not be empty".into()));
        }

        let name = name.to_string();
        let participants: BTreeSet<UserId> = participant_ids
            .iter()
            .copied()
            .filter(|id| *id != creator_id)
            .collect();

        let (chat_id, members) = blocking(&self.db, move |db| {
            let created = db.with_tx(|tx| {
                let now = parley_db::now();
                let chat_id = chats::insert(tx, &name, creator_id, is_group, &now)?;
                memberships::insert_if_absent(tx, chat_id, creator_id, &now)?;
                for &user_id in &participants {
                    memberships::insert_if_absent(tx, chat_id, user_id, &now)?;
                }

                let mut members = participants;
                members.insert(creator_id);
                Ok((chat_id, members))
            })?;
            Ok(created)
        })
        .await?;

        info!(
            "user {} created chat {} with {} members",
            creator_id,
            chat_id,
            members.len()
        );

        self.push_chat_lists(members).await;
        Ok(chat_id)
    }

    /// Patch a chat's name and/or avatar. `None` keeps the stored value;
    /// a supplied name must not be empty.
    ///
    /// Notifies according to the configured [`FanoutScope`]: by default
    /// every connected user gets their own refreshed chat list.
    pub async fn update_chat(
        &self,
        chat_id: ChatId,
        name: Option<String>,
        avatar_url: Option<String>,
    ) -> Result<Chat, ServiceError> {
        if name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ServiceError::Validation("chat name must not be empty".into()));
        }

        let chat = blocking(&self.db, move |db| {
            db.with_tx(|tx| {
                if chats::update(tx, chat_id, name.as_deref(), avatar_url.as_deref())? == 0 {
                    return Ok(None);
                }
                chats::find_by_id(tx, chat_id)
            })?
            .ok_or_else(|| ServiceError::chat_not_found(chat_id))
        })
        .await?;

        info!("chat {} updated", chat_id);

        let recipients = self
            .scope
            .recipients(&self.registry, &self.members, chat_id)
            .await;
        self.push_chat_lists(recipients).await;

        Ok(chat)
    }

    /// `user_id`'s chats, most recently active first.
    pub async fn list_chats(&self, user_id: UserId) -> Result<Vec<ChatSummary>, ServiceError> {
        blocking(&self.db, move |db| {
            Ok(db.with_conn(|conn| memberships::list_chat_summaries(conn, user_id))?)
        })
        .await
    }

    /// Send `user_id` their current chat list if they are online.
    pub async fn refresh_chat_list(&self, user_id: UserId) {
        if !self.registry.is_connected(user_id) {
            return;
        }

        match self.list_chats(user_id).await {
            Ok(chats) => {
                self.registry
                    .send_to(user_id, ServerEvent::ChatsUpdate { chats })
                    .await;
            }
            Err(e) => warn!("could not load chat list for user {}: {}", user_id, e),
        }
    }

    async fn push_chat_lists<I>(&self, recipients: I)
    where
        I: IntoIterator<Item = UserId>,
    {
        join_all(
            recipients
                .into_iter()
                .map(|user_id| self.refresh_chat_list(user_id)),
        )
        .await;
    }
}
