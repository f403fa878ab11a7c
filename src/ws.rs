//! WebSocket change events
//!
//! Every broadcast carries the changed row's identifier and new state, so
//! clients merge the single row instead of refetching whole tables.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::{DisputeStatus, OrderStatus};

const CHANNEL_CAPACITY: usize = 256;

/// A targeted change event
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChangeEvent {
    OrderUpdated { id: Uuid, status: OrderStatus },
    DisputeResolved { id: Uuid, status: DisputeStatus },
    WalletUpdated { user_id: Uuid },
}

/// Shared broadcast state
#[derive(Clone)]
pub struct WsState {
    tx: broadcast::Sender<ChangeEvent>,
}

impl WsState {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Fan an event out to all connected clients. Lossy when nobody
    /// listens, which is fine: events are a cache hint, not a ledger.
    pub fn broadcast_event(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for WsState {
    fn default() -> Self {
        Self::new()
    }
}

/// `/api/ws` upgrade handler
pub async fn ws_handler(State(ws_state): State<WsState>, upgrade: WebSocketUpgrade) -> Response {
    upgrade.on_upgrade(move |socket| handle_socket(socket, ws_state))
}

async fn handle_socket(socket: WebSocket, ws_state: WsState) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = ws_state.subscribe();

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        let Ok(payload) = serde_json::to_string(&event) else {
                            continue;
                        };
                        if sender.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "websocket client lagged behind event stream");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    // clients only listen; drain and ignore anything sent
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_row_identity() {
        let id = Uuid::new_v4();
        let event = ChangeEvent::OrderUpdated {
            id,
            status: OrderStatus::Delivered,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "order_updated");
        assert_eq!(json["status"], "delivered");
        assert_eq!(json["id"], id.to_string());
    }
}
