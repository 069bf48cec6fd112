use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

use shared::models::messages::ServerMessage;
use shared::state::AppState;

use crate::actions::connect::{handle_connect, ConnectParams, ConnectionRejection};
use crate::actions::default::handle_default_message;
use crate::actions::disconnect::handle_disconnect;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, params: ConnectParams) {
    let connection_id = Uuid::new_v4().to_string();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let session = match handle_connect(&state, &params, &connection_id, tx).await {
        Ok(session) => session,
        Err(rejection) => {
            reject(socket, &connection_id, rejection).await;
            return;
        }
    };

    loop {
        tokio::select! {
            Some(message) = rx.recv() => {
                let json = match message.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize message for {}: {}", connection_id, e);
                        continue;
                    }
                };
                if socket.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        debug!("Received message from connection {}: {}", connection_id, text.as_str());
                        handle_default_message(&state, &session, text.as_str()).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        info!("WebSocket error on connection {}: {}", connection_id, e);
                        break;
                    }
                    Some(Ok(_)) => continue,
                }
            }
        }
    }

    handle_disconnect(&state, &session).await;
}

/// Sends the error payload, then closes with the rejection's code.
async fn reject(mut socket: WebSocket, connection_id: &str, rejection: ConnectionRejection) {
    info!("Refusing connection {}: {}", connection_id, rejection);

    if let Ok(json) = ServerMessage::error(rejection.to_string()).to_json() {
        let _ = socket.send(Message::Text(json.into())).await;
    }
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: rejection.close_code(),
            reason: rejection.to_string().into(),
        })))
        .await;
}
