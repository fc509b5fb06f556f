use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

use parley_core::{Channel, ConnectionRegistry, ServiceError, Services};
use parley_types::UserId;
use parley_types::events::{ClientCommand, ServerEvent};

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Keeps a user's channel registered for as long as it is alive.
///
/// Dropping it unregisters the channel, so every way out of a session
/// (clean close, transport error, panic in a task, cancellation) cleans up.
struct Registration {
    registry: ConnectionRegistry,
    user_id: UserId,
    channel: Channel,
}

impl Registration {
    fn new(registry: ConnectionRegistry, user_id: UserId, channel: Channel) -> Self {
        registry.register(user_id, channel.clone());
        Self {
            registry,
            user_id,
            channel,
        }
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.registry.unregister(self.user_id, &self.channel);
    }
}

/// Serve one authenticated WebSocket until it closes.
pub async fn handle_connection(
    socket: WebSocket,
    services: Services,
    user_id: UserId,
    outbound_buffer: usize,
) {
    let (mut sender, mut receiver) = socket.split();
    let (channel, mut outbound) = Channel::new(outbound_buffer);
    let own_channel = channel.clone();
    let _registration = Registration::new(services.registry.clone(), user_id, channel);

    info!("user {} connected to gateway", user_id);
    services
        .registry
        .send_to(user_id, ServerEvent::Ready { user_id })
        .await;

    // Set by the reader whenever a Pong arrives
    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward queued events -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                event = outbound.recv() => {
                    let Some(event) = event else { break };
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            error!("failed to encode {} for user {}: {}", event.kind(), user_id, e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    // Evicted after a failed delivery: end the session so the
                    // client reconnects and re-fetches state.
                    if own_channel.is_evicted() {
                        info!("user {} connection was evicted, closing session", user_id);
                        break;
                    }
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read commands from client
    let recv_services = services.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            let msg = match frame {
                Ok(msg) => msg,
                Err(e) => {
                    warn!("user {} transport error: {}", user_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientCommand>(&text) {
                    Ok(cmd) => handle_command(&recv_services, user_id, cmd).await,
                    Err(e) => {
                        warn!(
                            "user {} bad command: {} -- raw: {}",
                            user_id,
                            e,
                            text.chars().take(200).collect::<String>()
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!("user {} disconnected from gateway", user_id);
}

/// Run one decoded client command on behalf of `user_id`.
///
/// A failing command is answered with an `error` event to the user; the
/// session itself carries on.
pub async fn handle_command(services: &Services, user_id: UserId, cmd: ClientCommand) {
    let result: Result<(), ServiceError> = match cmd {
        ClientCommand::RequestUpdate => {
            services.chats.refresh_chat_list(user_id).await;
            Ok(())
        }

        ClientCommand::JoinChat { chat_id } => {
            match services.members.add_member(chat_id, user_id).await {
                Ok(added) => {
                    info!("user {} joined chat {} (new: {})", user_id, chat_id, added);
                    services
                        .registry
                        .send_to(user_id, ServerEvent::ChatJoined { chat_id })
                        .await;
                    services.chats.refresh_chat_list(user_id).await;
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }

        // Notification only: the membership row stays.
        ClientCommand::LeaveChat { chat_id } => {
            info!("user {} left chat {}", user_id, chat_id);
            services
                .registry
                .send_to(user_id, ServerEvent::ChatLeft { chat_id })
                .await;
            Ok(())
        }

        ClientCommand::SendMessage { chat_id, content } => services
            .messages
            .send_message(chat_id, user_id, &content)
            .await
            .map(|_| ()),

        ClientCommand::Unknown => {
            debug!("user {} sent an unknown command type, ignoring", user_id);
            Ok(())
        }
    };

    if let Err(e) = result {
        warn!("user {} command rejected: {}", user_id, e);
        services
            .registry
            .send_to(
                user_id,
                ServerEvent::Error {
                    message: e.to_string(),
                },
            )
            .await;
    }
}
