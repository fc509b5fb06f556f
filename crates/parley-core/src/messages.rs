use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, info, warn};

use parley_db::{Database, chats, memberships, messages, users};
use parley_types::events::ServerEvent;
use parley_types::models::{MessageRecord, MessageView};
use parley_types::{ChatId, MessageId, UserId};

use crate::fanout::FanoutScope;
use crate::membership::MembershipResolver;
use crate::registry::ConnectionRegistry;
use crate::{ServiceError, blocking};

/// Shown in place of a sender whose name cannot be resolved.
pub const UNKNOWN_USER: &str = "Unknown User";

/// Message lifecycle: send, edit, delete, history.
#[derive(Clone)]
pub struct MessageService {
    db: Arc<Database>,
    registry: ConnectionRegistry,
    members: MembershipResolver,
    scope: FanoutScope,
}

impl MessageService {
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

    /// Persist a message and push it to every member of the chat.
    ///
    /// If the chat has no membership rows at all, the sender is recorded as
    /// a member in the same transaction as the message, so they at least
    /// receive their own echo. This repair only happens here.
    pub async fn send_message(
        &self,
        chat_id: ChatId,
        sender_id: UserId,
        content: &str,
    ) -> Result<MessageView, ServiceError> {
        let content = content.to_string();
        let (record, recipients, healed) = blocking(&self.db, move |db| {
            // An unknown chat wins over bad content.
            if !db.with_conn(|conn| chats::exists(conn, chat_id))? {
                return Err(ServiceError::chat_not_found(chat_id));
            }
            if content.trim().is_empty() {
                return Err(ServiceError::Validation("message content must not be empty".into()));
            }

            db.with_tx(|tx| {
                if !chats::exists(tx, chat_id)? {
                    return Ok(None);
                }

                let created_at = parley_db::now();
                let id = messages::insert(tx, chat_id, sender_id, &content, &created_at)?;

                let mut recipients = memberships::list_user_ids(tx, chat_id)?;
                let healed = recipients.is_empty();
                if healed {
                    memberships::insert_if_absent(tx, chat_id, sender_id, &created_at)?;
                    recipients.insert(sender_id);
                }

                let record = MessageRecord {
                    id,
                    chat_id,
                    sender_id,
                    content,
                    created_at,
                };
                Ok(Some((record, recipients, healed)))
            })?
            .ok_or_else(|| ServiceError::chat_not_found(chat_id))
        })
        .await?;

        if healed {
            info!(
                "chat {} had no members; recorded sender {} as member",
                chat_id, sender_id
            );
        }

        let sender_name = self.sender_name(sender_id).await;
        let view = MessageView::new(record, sender_name);

        let delivered = self
            .registry
            .broadcast(
                recipients.iter().copied(),
                ServerEvent::Message {
                    message: view.clone(),
                },
            )
            .await;
        debug!(
            "message {} in chat {} delivered to {}/{} members",
            view.id,
            chat_id,
            delivered,
            recipients.len()
        );

        Ok(view)
    }

    /// Replace a message's content. The timestamp moves to the edit time;
    /// id, chat and sender stay the same.
    pub async fn edit_message(
        &self,
        message_id: MessageId,
        new_content: &str,
    ) -> Result<MessageRecord, ServiceError> {
        if new_content.trim().is_empty() {
            return Err(ServiceError::Validation("message content must not be empty".into()));
        }

        let new_content = new_content.to_string();
        let record = blocking(&self.db, move |db| {
            db.with_tx(|tx| {
                if messages::update(tx, message_id, &new_content, &parley_db::now())? == 0 {
                    return Ok(None);
                }
                messages::find_by_id(tx, message_id)
            })?
            .ok_or_else(|| ServiceError::message_not_found(message_id))
        })
        .await?;

        info!("message {} edited", message_id);

        let recipients = self
            .scope
            .recipients(&self.registry, &self.members, record.chat_id)
            .await;
        self.registry
            .broadcast(
                recipients,
                ServerEvent::MessageEdit {
                    id: record.id,
                    chat_id: record.chat_id,
                    sender_id: record.sender_id,
                    content: record.content.clone(),
                    created_at: record.created_at,
                },
            )
            .await;

        Ok(record)
    }

    /// Hard-delete a message and tell clients where it was.
    pub async fn delete_message(&self, message_id: MessageId) -> Result<MessageRecord, ServiceError> {
        let record = blocking(&self.db, move |db| {
            db.with_tx(|tx| {
                let Some(record) = messages::find_by_id(tx, message_id)? else {
                    return Ok(None);
                };
                messages::delete(tx, message_id)?;
                Ok(Some(record))
            })?
            .ok_or_else(|| ServiceError::message_not_found(message_id))
        })
        .await?;

        info!("message {} deleted from chat {}", message_id, record.chat_id);

        let recipients = self
            .scope
            .recipients(&self.registry, &self.members, record.chat_id)
            .await;
        self.registry
            .broadcast(
                recipients,
                ServerEvent::MessageDelete {
                    id: record.id,
                    chat_id: record.chat_id,
                    sender_id: record.sender_id,
                },
            )
            .await;

        Ok(record)
    }

    /// Chat history, oldest first, each message with its sender's name.
    /// Names are looked up once per distinct sender.
    pub async fn get_messages(&self, chat_id: ChatId) -> Result<Vec<MessageView>, ServiceError> {
        blocking(&self.db, move |db| {
            let loaded = db.with_conn(|conn| {
                if !chats::exists(conn, chat_id)? {
                    return Ok(None);
                }

                let records = messages::list_by_chat(conn, chat_id)?;
                let senders: Vec<UserId> = records
                    .iter()
                    .map(|m| m.sender_id)
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect();

                // A failed name lookup degrades to placeholders, not an error.
                let names = users::find_names_by_ids(conn, &senders).unwrap_or_else(|e| {
                    warn!("sender name lookup failed for chat {}: {}", chat_id, e);
                    HashMap::new()
                });
                Ok(Some((records, names)))
            })?;

            let (records, names) = loaded.ok_or_else(|| ServiceError::chat_not_found(chat_id))?;
            Ok(records
                .into_iter()
                .map(|record| {
                    let name = names
                        .get(&record.sender_id)
                        .cloned()
                        .unwrap_or_else(|| UNKNOWN_USER.to_string());
                    MessageView::new(record, name)
                })
                .collect())
        })
        .await
    }

    /// Display name for `sender_id`; never fails.
    async fn sender_name(&self, sender_id: UserId) -> String {
        let lookup = blocking(&self.db, move |db| {
            Ok(db.with_conn(|conn| users::find_name_by_id(conn, sender_id))?)
        })
        .await;

        match lookup {
            Ok(Some(name)) => name,
            Ok(None) => UNKNOWN_USER.to_string(),
            Err(e) => {
                warn!("sender name lookup failed for user {}: {}", sender_id, e);
                UNKNOWN_USER.to_string()
            }
        }
    }
}
