use crate::app::AppState;
use crate::room::ParticipantSink;
use crate::signaling::SignalingRelay;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.max_message_size(state.max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state.relay))
}

async fn handle_socket(socket: WebSocket, relay: SignalingRelay) {
    let (sink, mut rx) = ParticipantSink::channel();
    let connection_id = sink.connection();
    info!("New WebSocket connection: {}", connection_id);

    let (mut sender, mut receiver) = socket.split();
    let mut connection = relay.connect(sink);

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.to_string().into())).await.is_err() {
                break;
            }
        }
    });

    // The connection moves into the receive task; if that task is aborted the
    // drop of `connection` still deregisters it.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let outcome = connection.handle_text(text.as_str());
                    debug!("{}: {:?}", connection.connection_id(), outcome);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }

        connection.close();
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    info!("WebSocket disconnected: {}", connection_id);
}
