//! WebSocket endpoint for real-time observers.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use publisher::{EventPublisher, WireMessage};
use record_store::RecordStore;
use tokio::sync::mpsc;

use crate::routes::orders::AppState;

/// GET /ws — upgrade the connection and register the observer.
pub async fn upgrade<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    ws: WebSocketUpgrade,
) -> Response {
    let publisher = state.publisher.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, publisher))
}

/// Pumps published frames into the socket until either side goes away.
///
/// The observer gets one connection acknowledgment and no backlog; missed
/// notifications are fetched through the list endpoint instead.
async fn handle_socket(socket: WebSocket, publisher: EventPublisher) {
    let (mut sink, mut stream) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let observer_id = publisher.register_observer(tx).await;

    let ack = match WireMessage::connected().to_json() {
        Ok(text) => text,
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize connection ack");
            publisher.unregister_observer(observer_id).await;
            return;
        }
    };
    if sink.send(Message::Text(ack.into())).await.is_err() {
        publisher.unregister_observer(observer_id).await;
        return;
    }

    loop {
        tokio::select! {
            frame = rx.recv() => {
                match frame {
                    Some(text) => {
                        if sink.send(Message::Text(text.into())).await.is_err() {
                            break;
                        }
                    }
                    // Publisher evicted us after a send failure.
                    None => break,
                }
            }
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    // Inbound frames are ignored; this is a push-only stream.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    publisher.unregister_observer(observer_id).await;
}
