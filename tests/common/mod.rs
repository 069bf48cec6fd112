#![allow(dead_code)]

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use shared::models::messages::ServerMessage;
use shared::services::auth_service::AuthServiceTrait;
use shared::state::AppState;

pub const TEST_SECRET: &str = "integration-test-secret";
pub const RECEIVE_TIMEOUT: Duration = Duration::from_secs(3);

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub fn test_state() -> AppState {
    AppState::in_memory(TEST_SECRET.to_string())
}

pub fn token_for(state: &AppState, user_id: &str) -> String {
    state
        .auth_service
        .generate_token(user_id, Some(format!("{} (display)", user_id)))
        .expect("Failed to generate test token")
        .token
}

/// Serves the full router on an ephemeral port and returns its address.
pub async fn spawn_server(state: AppState) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    let app = api::app(state);
    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Test server stopped unexpectedly");
    });
    addr.to_string()
}

pub async fn connect(addr: &str, token: Option<&str>, game_id: Option<&str>) -> Client {
    let mut url = format!("ws://{}/ws", addr);
    let mut query = Vec::new();
    if let Some(token) = token {
        query.push(format!("token={}", token));
    }
    if let Some(game_id) = game_id {
        query.push(format!("gameId={}", game_id));
    }
    if !query.is_empty() {
        url = format!("{}?{}", url, query.join("&"));
    }

    let (client, _) = connect_async(url)
        .await
        .expect("WebSocket handshake failed");
    client
}

pub async fn send_json(client: &mut Client, body: serde_json::Value) {
    client
        .send(Message::text(body.to_string()))
        .await
        .expect("Failed to send frame");
}

/// Next server message, skipping control frames. Panics on close or timeout.
pub async fn next_message(client: &mut Client) -> ServerMessage {
    loop {
        let frame = tokio::time::timeout(RECEIVE_TIMEOUT, client.next())
            .await
            .expect("Timed out waiting for a server message")
            .expect("Connection ended while waiting for a message")
            .expect("WebSocket error while waiting for a message");
        match frame {
            Message::Text(text) => {
                return serde_json::from_str(text.as_str())
                    .unwrap_or_else(|e| panic!("Unexpected payload {}: {}", text.as_str(), e));
            }
            Message::Close(frame) => panic!("Connection closed unexpectedly: {:?}", frame),
            _ => continue,
        }
    }
}

/// Asserts nothing but control frames arrive within `window`.
pub async fn expect_silence(client: &mut Client, window: Duration) {
    let deadline = tokio::time::Instant::now() + window;
    loop {
        match tokio::time::timeout_at(deadline, client.next()).await {
            Err(_) => return,
            Ok(Some(Ok(Message::Text(text)))) => {
                panic!("Expected no message, got {}", text.as_str())
            }
            Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => continue,
            Ok(_) => return,
        }
    }
}

/// Reads the rejection payload and returns the close code that follows it.
pub async fn expect_rejection(client: &mut Client) -> (String, u16) {
    let message = match next_message(client).await {
        ServerMessage::Error { message } => message,
        other => panic!("Expected an error payload, got {:?}", other),
    };

    loop {
        let frame = tokio::time::timeout(RECEIVE_TIMEOUT, client.next())
            .await
            .expect("Timed out waiting for the close frame");
        match frame {
            Some(Ok(Message::Close(Some(close)))) => return (message, u16::from(close.code)),
            Some(Ok(Message::Close(None))) | None => panic!("Connection closed without a code"),
            Some(Ok(_)) => continue,
            Some(Err(e)) => panic!("WebSocket error before close: {}", e),
        }
    }
}

/// Connects both users to `game_id` and returns (host, guest) once each has
/// seen `ready`. Seat order is read from the `ready` frames.
pub async fn ready_pair(
    addr: &str,
    state: &AppState,
    game_id: &str,
    first: &str,
    second: &str,
) -> (Client, Client) {
    let mut a = connect(addr, Some(&token_for(state, first)), Some(game_id)).await;
    let mut b = connect(addr, Some(&token_for(state, second)), Some(game_id)).await;

    let a_side = match next_message(&mut a).await {
        ServerMessage::Ready { side, .. } => side,
        other => panic!("Expected ready, got {:?}", other),
    };
    match next_message(&mut b).await {
        ServerMessage::Ready { side, .. } => assert_eq!(side, a_side.opposite()),
        other => panic!("Expected ready, got {:?}", other),
    }

    if a_side == shared::models::game_session::Side::Left {
        (a, b)
    } else {
        (b, a)
    }
}

pub async fn wait_until_online(state: &AppState, user_id: &str) {
    let deadline = tokio::time::Instant::now() + RECEIVE_TIMEOUT;
    while !state
        .websocket_service
        .is_online(user_id)
        .await
        .unwrap_or(false)
    {
        assert!(
            tokio::time::Instant::now() < deadline,
            "{} never came online",
            user_id
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
