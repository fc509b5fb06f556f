#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use parley_core::FanoutScope;
use parley_db::Database;
use parley_server::config::Config;

pub type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    pub http: reqwest::Client,
}

impl TestServer {
    pub async fn start(scope: FanoutScope) -> Self {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let config = Config {
            jwt_secret: "test-secret".into(),
            delivery_timeout: Duration::from_millis(200),
            fanout_scope: scope,
            ..Config::default()
        };
        let app = parley_server::build_app(db, &config);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            http: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Register and log in; returns `(user_id, access_token)`.
    pub async fn signup(&self, login: &str) -> (i64, String) {
        let body = json!({ "login": login, "password": "hunter22" });

        let res = self
            .http
            .post(self.url("/auth/register"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 201);
        let user_id = res.json::<Value>().await.unwrap()["user_id"].as_i64().unwrap();

        let res = self
            .http
            .post(self.url("/auth/login"))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        let token = res.json::<Value>().await.unwrap()["access_token"]
            .as_str()
            .unwrap()
            .to_string();

        (user_id, token)
    }

    /// Open a gateway socket and consume its `ready` event.
    pub async fn connect(&self, token: &str) -> Socket {
        let url = format!("ws://{}/gateway?token={}", self.addr, token);
        let (mut socket, _) = connect_async(url).await.unwrap();
        let ready = next_event(&mut socket).await;
        assert_eq!(ready["type"], "ready");
        socket
    }

    pub async fn create_chat(&self, token: &str, name: &str, participants: &[i64]) -> i64 {
        let res = self
            .http
            .post(self.url("/chats/create"))
            .bearer_auth(token)
            .json(&json!({ "name": name, "participant_ids": participants }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        res.json::<Value>().await.unwrap()["chat_id"].as_i64().unwrap()
    }
}

/// Next JSON event from the server, skipping control frames.
pub async fn next_event(socket: &mut Socket) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for an event")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

pub async fn send_command(socket: &mut Socket, command: Value) {
    send_raw(socket, &command.to_string()).await;
}

pub async fn send_raw(socket: &mut Socket, text: &str) {
    socket
        .send(Message::Text(text.to_string().into()))
        .await
        .unwrap();
}

/// Assert that nothing arrives on `socket` for a short while.
pub async fn assert_quiet(socket: &mut Socket) {
    let waited = tokio::time::timeout(Duration::from_millis(200), socket.next()).await;
    assert!(waited.is_err(), "unexpected frame: {:?}", waited);
}
