mod common;

use serde_json::json;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Error as WsError;

use common::{TestServer, assert_quiet, next_event, send_command, send_raw};
use parley_core::FanoutScope;

#[tokio::test]
async fn chat_message_and_delete_reach_connected_members() {
    let server = TestServer::start(FanoutScope::Everyone).await;
    let (alice_id, alice_token) = server.signup("alice").await;
    let (bob_id, bob_token) = server.signup("bob").await;
    let mut alice = server.connect(&alice_token).await;
    let mut bob = server.connect(&bob_token).await;

    let chat_id = server.create_chat(&alice_token, "pair", &[bob_id]).await;

    for socket in [&mut alice, &mut bob] {
        let update = next_event(socket).await;
        assert_eq!(update["type"], "chats_update");
        assert_eq!(update["chats"][0]["id"], chat_id);
        assert_eq!(update["chats"][0]["name"], "pair");
    }

    send_command(
        &mut alice,
        json!({ "type": "send_message", "chat_id": chat_id, "content": "hello bob" }),
    )
    .await;

    let received = next_event(&mut bob).await;
    assert_eq!(received["type"], "message");
    assert_eq!(received["message"]["sender_id"], alice_id);
    assert_eq!(received["message"]["sender_name"], "alice");
    assert_eq!(received["message"]["content"], "hello bob");
    let echo = next_event(&mut alice).await;
    assert_eq!(echo["message"]["id"], received["message"]["id"]);

    let message_id = received["message"]["id"].as_i64().unwrap();
    let res = server
        .http
        .delete(server.url(&format!("/messages/delete?message_id={}", message_id)))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    for socket in [&mut alice, &mut bob] {
        let deleted = next_event(socket).await;
        assert_eq!(deleted["type"], "message_delete");
        assert_eq!(deleted["id"], message_id);
        assert_eq!(deleted["chat_id"], chat_id);
        assert_eq!(deleted["sender_id"], alice_id);
    }
}

#[tokio::test]
async fn upgrade_without_valid_token_is_unauthorized() {
    let server = TestServer::start(FanoutScope::Everyone).await;

    for url in [
        format!("ws://{}/gateway?token=not-a-jwt", server.addr),
        format!("ws://{}/gateway", server.addr),
    ] {
        match connect_async(url).await {
            Err(WsError::Http(response)) => assert_eq!(response.status(), 401),
            other => panic!("expected 401, got {:?}", other.map(|_| ())),
        }
    }
}

#[tokio::test]
async fn malformed_and_unknown_frames_do_not_end_the_session() {
    let server = TestServer::start(FanoutScope::Everyone).await;
    let (_, token) = server.signup("carol").await;
    let mut socket = server.connect(&token).await;

    send_raw(&mut socket, "definitely not json").await;
    send_command(&mut socket, json!({ "type": "mystery", "x": 1 })).await;
    assert_quiet(&mut socket).await;

    send_command(&mut socket, json!({ "type": "request_update" })).await;
    let update = next_event(&mut socket).await;
    assert_eq!(update["type"], "chats_update");
    assert_eq!(update["chats"], json!([]));
}

#[tokio::test]
async fn join_then_leave_over_the_socket() {
    let server = TestServer::start(FanoutScope::Everyone).await;
    let (_, owner_token) = server.signup("owner").await;
    let (_, guest_token) = server.signup("guest").await;
    let chat_id = server.create_chat(&owner_token, "open room", &[]).await;
    let mut guest = server.connect(&guest_token).await;

    send_command(&mut guest, json!({ "type": "join_chat", "chat_id": chat_id })).await;
    let joined = next_event(&mut guest).await;
    assert_eq!(joined, json!({ "type": "chat_joined", "chat_id": chat_id }));
    let update = next_event(&mut guest).await;
    assert_eq!(update["chats"][0]["id"], chat_id);

    send_command(&mut guest, json!({ "type": "leave_chat", "chat_id": chat_id })).await;
    let left = next_event(&mut guest).await;
    assert_eq!(left, json!({ "type": "chat_left", "chat_id": chat_id }));

    send_command(&mut guest, json!({ "type": "join_chat", "chat_id": 9999 })).await;
    let error = next_event(&mut guest).await;
    assert_eq!(error["type"], "error");
}

#[tokio::test]
async fn reconnect_replaces_the_delivery_target() {
    let server = TestServer::start(FanoutScope::Everyone).await;
    let (_, token) = server.signup("dave").await;
    let mut first = server.connect(&token).await;
    let mut second = server.connect(&token).await;

    send_command(&mut first, json!({ "type": "request_update" })).await;

    // Replies are addressed to the user, so they land on the newest socket.
    let update = next_event(&mut second).await;
    assert_eq!(update["type"], "chats_update");
    assert_quiet(&mut first).await;
}

#[tokio::test]
async fn members_scope_keeps_edits_inside_the_chat() {
    let server = TestServer::start(FanoutScope::Members).await;
    let (_, alice_token) = server.signup("alice").await;
    let (_, eve_token) = server.signup("eve").await;
    let chat_id = server.create_chat(&alice_token, "private", &[]).await;
    let mut alice = server.connect(&alice_token).await;
    let mut eve = server.connect(&eve_token).await;

    let res = server
        .http
        .post(server.url("/messages/send"))
        .bearer_auth(&alice_token)
        .json(&json!({ "chat_id": chat_id, "content": "draft" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let message_id = res.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .unwrap();
    assert_eq!(next_event(&mut alice).await["type"], "message");

    let res = server
        .http
        .put(server.url(&format!(
            "/messages/edit?message_id={}&new_content=final",
            message_id
        )))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let edit = next_event(&mut alice).await;
    assert_eq!(edit["type"], "message_edit");
    assert_eq!(edit["content"], "final");
    assert_quiet(&mut eve).await;
}
