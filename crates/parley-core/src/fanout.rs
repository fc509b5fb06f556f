use std::fmt;
use std::str::FromStr;

use tracing::warn;

use parley_types::{ChatId, UserId};

use crate::membership::MembershipResolver;
use crate::registry::ConnectionRegistry;

/// Who hears about chat updates, message edits and message deletes.
///
/// New messages and new chats always go to members only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanoutScope {
    /// Every connected user, member or not.
    #[default]
    Everyone,
    /// Only members of the affected chat.
    Members,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown fan-out scope '{0}' (expected 'everyone' or 'members')")]
pub struct ParseScopeError(String);

impl FromStr for FanoutScope {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "everyone" | "all" => Ok(Self::Everyone),
            "members" => Ok(Self::Members),
            other => Err(ParseScopeError(other.to_string())),
        }
    }
}

impl fmt::Display for FanoutScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Everyone => f.write_str("everyone"),
            Self::Members => f.write_str("members"),
        }
    }
}

impl FanoutScope {
    /// Recipients of a chat-scoped notification under this scope.
    pub(crate) async fn recipients(
        self,
        registry: &ConnectionRegistry,
        members: &MembershipResolver,
        chat_id: ChatId,
    ) -> Vec<UserId> {
        match self {
            Self::Everyone => registry.connected_users(),
            Self::Members => match members.members_of(chat_id).await {
                Ok(ids) => ids.into_iter().collect(),
                Err(e) => {
                    warn!("could not resolve members of chat {}: {}", chat_id, e);
                    Vec::new()
                }
            },
        }
    }
}
