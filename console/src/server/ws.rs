//! WebSocket endpoint for live deployment consoles

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::errors::ConsoleError;
use crate::logstream::{ChannelObserver, Observer, SubscriptionSession};
use crate::server::state::ServerState;

pub async fn ws_handler(
    State(state): State<Arc<ServerState>>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<ServerState>) {
    let (observer, mut outbound) = ChannelObserver::new();
    let observer = Arc::new(observer);
    let observer_id = observer.id().to_string();
    info!("Console client {} connected", observer_id);

    let mut session = SubscriptionSession::new(state.broadcaster.clone(), observer.clone());

    loop {
        tokio::select! {
            message = outbound.recv() => {
                let Some(message) = message else {
                    break;
                };
                let frame = match serde_json::to_string(&message) {
                    Ok(frame) => frame,
                    Err(e) => {
                        error!("Unable to encode console message: {}", e);
                        continue;
                    }
                };
                if let Err(e) = socket.send(Message::Text(frame.into())).await {
                    debug!("Console client {} unreachable: {}", observer_id, e);
                    break;
                }
            }
            frame = socket.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match session.handle_text(text.as_str()).await {
                            Ok(()) => {}
                            Err(e @ ConsoleError::ProtocolError(_)) => {
                                warn!("Ignoring message from {}: {}", observer_id, e);
                            }
                            Err(e) => {
                                error!("Subscription of {} failed: {}", observer_id, e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("Console client {} socket error: {}", observer_id, e);
                        break;
                    }
                }
            }
        }
    }

    observer.close();
    session.close();
    info!("Console client {} disconnected", observer_id);
}
