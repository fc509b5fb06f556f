use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use parley_types::UserId;
use parley_types::events::ServerEvent;

pub const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;

/// Delivery handle for one live connection.
///
/// Two handles are the same channel only if they came from the same
/// [`Channel::new`] call; clones share identity.
#[derive(Debug, Clone)]
pub struct Channel {
    conn_id: Uuid,
    tx: mpsc::Sender<ServerEvent>,
    /// Set once a delivery on this channel failed and it was evicted.
    evicted: Arc<AtomicBool>,
}

impl Channel {
    /// Create a channel with room for `capacity` undelivered events.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                conn_id: Uuid::new_v4(),
                tx,
                evicted: Arc::new(AtomicBool::new(false)),
            },
            rx,
        )
    }

    pub fn conn_id(&self) -> Uuid {
        self.conn_id
    }

    pub fn same_as(&self, other: &Channel) -> bool {
        self.conn_id == other.conn_id
    }

    /// Whether the registry dropped this channel after a failed delivery.
    /// Stays true even if the same user has since registered elsewhere.
    pub fn is_evicted(&self) -> bool {
        self.evicted.load(Ordering::Acquire)
    }
}

/// Outcome of one [`ConnectionRegistry::send_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// No channel registered for the user; the event was dropped.
    NotConnected,
    /// The channel was dead or too slow; it has been evicted.
    Dropped,
}

/// Process-wide map from user to their single live delivery channel.
#[derive(Clone)]
pub struct ConnectionRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    /// user_id -> current channel. The lock is never held across an await.
    channels: RwLock<HashMap<UserId, Channel>>,

    /// Upper bound on how long one delivery may wait for queue space
    delivery_timeout: Duration,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_DELIVERY_TIMEOUT)
    }
}

impl ConnectionRegistry {
    pub fn new(delivery_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                channels: RwLock::new(HashMap::new()),
                delivery_timeout,
            }),
        }
    }

    /// Make `channel` the delivery target for `user_id`, replacing any
    /// previous one. The replaced socket is not closed here.
    pub fn register(&self, user_id: UserId, channel: Channel) {
        let conn_id = channel.conn_id;
        let previous = self
            .inner
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user_id, channel);

        match previous {
            Some(old) => debug!(
                "user {} re-registered: connection {} replaces {}",
                user_id, conn_id, old.conn_id
            ),
            None => debug!("user {} registered connection {}", user_id, conn_id),
        }
    }

    /// Remove the mapping for `user_id`, but only if it still points at
    /// `channel`. A stale disconnect cannot evict a newer connection.
    pub fn unregister(&self, user_id: UserId, channel: &Channel) -> bool {
        let mut channels = self
            .inner
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let owns_slot = channels
            .get(&user_id)
            .is_some_and(|current| current.same_as(channel));
        if owns_slot {
            channels.remove(&user_id);
            debug!("user {} unregistered connection {}", user_id, channel.conn_id);
        }
        owns_slot
    }

    /// Deliver `event` to `user_id` if they are connected.
    ///
    /// Never fails: a closed or stalled channel is evicted and the event is
    /// dropped, which is logged and reported as [`Delivery::Dropped`].
    pub async fn send_to(&self, user_id: UserId, event: ServerEvent) -> Delivery {
        let Some(channel) = self.lookup(user_id) else {
            return Delivery::NotConnected;
        };

        let kind = event.kind();
        match channel
            .tx
            .send_timeout(event, self.inner.delivery_timeout)
            .await
        {
            Ok(()) => {
                debug!("delivered {} to user {}", kind, user_id);
                Delivery::Delivered
            }
            Err(e) => {
                warn!(
                    "dropping {} for user {} (connection {}): {}",
                    kind, user_id, channel.conn_id, e
                );
                channel.evicted.store(true, Ordering::Release);
                self.unregister(user_id, &channel);
                Delivery::Dropped
            }
        }
    }

    /// Send `event` to every id in `user_ids`, concurrently and
    /// independently. Returns how many recipients got it.
    pub async fn broadcast<I>(&self, user_ids: I, event: ServerEvent) -> usize
    where
        I: IntoIterator<Item = UserId>,
    {
        let sends = user_ids
            .into_iter()
            .map(|user_id| self.send_to(user_id, event.clone()));

        join_all(sends)
            .await
            .into_iter()
            .filter(|d| *d == Delivery::Delivered)
            .count()
    }

    /// Users with a live channel right now.
    pub fn connected_users(&self) -> Vec<UserId> {
        self.inner
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    pub fn is_connected(&self, user_id: UserId) -> bool {
        self.inner
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&user_id)
    }

    fn lookup(&self, user_id: UserId) -> Option<Channel> {
        self.inner
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&user_id)
            .cloned()
    }
}
