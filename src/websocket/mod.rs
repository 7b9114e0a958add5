//! WebSocket server for real-time rental updates
//!
//! Clients authenticate with the same JWT as the REST API and only receive
//! events for rentals they are a party to. Polling stays authoritative; a
//! push is a hint to refresh early.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

use crate::middleware::{AuthenticatedUser, SocketUser};
use crate::rental::{Party, Rental, RentalEvent, RentalService};

/// WebSocket server state
#[derive(Clone)]
pub struct WsState {
    /// Broadcast channel for rental events
    pub tx: broadcast::Sender<RentalEvent>,
    /// Connected clients registry
    pub clients: Arc<RwLock<HashMap<String, ClientInfo>>>,
}

/// Client connection information
#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub client_id: String,
    pub user_id: Uuid,
    /// Rentals explicitly watched; empty means every rental of `user_id`
    pub subscribed_rentals: Vec<Uuid>,
}

impl ClientInfo {
    fn wants(&self, event: &RentalEvent) -> bool {
        if !self.subscribed_rentals.is_empty() {
            return self.subscribed_rentals.contains(&event.rental_id);
        }
        event.concerns(self.user_id)
    }
}

/// Whether `user` may watch `rental` explicitly
fn may_watch(rental: &Rental, user: &AuthenticatedUser) -> bool {
    Party::of(rental, user.user_id, user.is_admin()).is_some()
}

/// Client message types
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Subscribe { rental_ids: Vec<Uuid> },
    Unsubscribe { rental_ids: Vec<Uuid> },
    Ping,
}

/// Server message types
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    Event { event: RentalEvent },
    Subscribed { rental_ids: Vec<Uuid> },
    Unsubscribed { rental_ids: Vec<Uuid> },
    Pong,
}

impl WsState {
    /// Create new WebSocket state
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            tx,
            clients: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Broadcast a rental event to interested clients
    pub async fn broadcast_event(&self, event: RentalEvent) {
        // no receivers is normal when nobody is connected
        if self.tx.receiver_count() == 0 {
            return;
        }
        if let Err(e) = self.tx.send(event) {
            tracing::error!("Failed to broadcast event: {}", e);
        }
    }

    async fn register_client(&self, client_id: String, user_id: Uuid) {
        let mut clients = self.clients.write().await;
        clients.insert(
            client_id.clone(),
            ClientInfo {
                client_id,
                user_id,
                subscribed_rentals: vec![],
            },
        );
    }

    async fn unregister_client(&self, client_id: &str) {
        let mut clients = self.clients.write().await;
        clients.remove(client_id);
        tracing::info!("Client {} disconnected", client_id);
    }

    async fn update_subscriptions(&self, client_id: &str, rental_ids: Vec<Uuid>) {
        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get_mut(client_id) {
            client.subscribed_rentals = rental_ids;
        }
    }
}

impl Default for WsState {
    fn default() -> Self {
        Self::new()
    }
}

/// WebSocket handler - authenticates, then upgrades HTTP connection to WebSocket
pub async fn ws_handler(
    SocketUser(user): SocketUser,
    State(state): State<WsState>,
    State(rentals): State<Arc<RentalService>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, rentals, user))
}

/// Keep the requested rentals `user` is a party to, dropping the rest
async fn permitted_rentals(
    rentals: &RentalService,
    user: &AuthenticatedUser,
    rental_ids: Vec<Uuid>,
) -> Vec<Uuid> {
    let mut permitted = Vec::with_capacity(rental_ids.len());
    for id in rental_ids {
        match rentals.get_rental(id).await {
            Ok(rental) if may_watch(&rental, user) => permitted.push(id),
            Ok(_) => tracing::warn!(
                user_id = %user.user_id,
                rental_id = %id,
                "Refused subscription to a foreign rental"
            ),
            Err(e) => tracing::debug!(rental_id = %id, "Subscription skipped: {}", e),
        }
    }
    permitted
}

async fn handle_socket(
    socket: WebSocket,
    state: WsState,
    rentals: Arc<RentalService>,
    user: AuthenticatedUser,
) {
    let client_id = Uuid::new_v4().to_string();
    state.register_client(client_id.clone(), user.user_id).await;

    let (mut sender, mut receiver) = socket.split();
    let (internal_tx, mut internal_rx) = mpsc::channel::<ServerMessage>(32);

    let mut rx = state.tx.subscribe();
    let client_id_send = client_id.clone();
    let state_send = state.clone();

    let mut send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                Ok(event) = rx.recv() => {
                    let wanted = {
                        let clients = state_send.clients.read().await;
                        clients
                            .get(&client_id_send)
                            .map(|client| client.wants(&event))
                            .unwrap_or(false)
                    };
                    if wanted {
                        let msg = ServerMessage::Event { event };
                        if let Ok(text) = serde_json::to_string(&msg) {
                            if sender.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                    }
                }
                Some(msg) = internal_rx.recv() => {
                    if let Ok(text) = serde_json::to_string(&msg) {
                        if sender.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                }
                else => break,
            }
        }
    });

    let state_recv = state.clone();
    let client_id_recv = client_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let Ok(client_msg) = serde_json::from_str::<ClientMessage>(&text) else {
                        tracing::debug!("Ignoring malformed message from {}", client_id_recv);
                        continue;
                    };
                    match client_msg {
                        ClientMessage::Subscribe { rental_ids } => {
                            let rental_ids =
                                permitted_rentals(&rentals, &user, rental_ids).await;
                            state_recv
                                .update_subscriptions(&client_id_recv, rental_ids.clone())
                                .await;
                            let _ = internal_tx
                                .send(ServerMessage::Subscribed { rental_ids })
                                .await;
                        }
                        ClientMessage::Unsubscribe { rental_ids } => {
                            let current = {
                                let clients = state_recv.clients.read().await;
                                clients
                                    .get(&client_id_recv)
                                    .map(|c| c.subscribed_rentals.clone())
                                    .unwrap_or_default()
                            };
                            let remaining = current
                                .into_iter()
                                .filter(|id| !rental_ids.contains(id))
                                .collect();
                            state_recv
                                .update_subscriptions(&client_id_recv, remaining)
                                .await;
                            let _ = internal_tx
                                .send(ServerMessage::Unsubscribed { rental_ids })
                                .await;
                        }
                        ClientMessage::Ping => {
                            let _ = internal_tx.send(ServerMessage::Pong).await;
                        }
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    state.unregister_client(&client_id).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rental::lifecycle::tests::rental;
    use crate::models::UserRole;
    use crate::rental::{RentalEventKind, RentalStatus};

    #[test]
    fn test_client_filters_by_user() {
        let r = rental(RentalStatus::Requested);
        let event = RentalEvent::new(&r, RentalEventKind::Created);

        let owner = ClientInfo {
            client_id: "a".to_string(),
            user_id: r.owner_id,
            subscribed_rentals: vec![],
        };
        let stranger = ClientInfo {
            client_id: "b".to_string(),
            user_id: Uuid::new_v4(),
            subscribed_rentals: vec![],
        };
        let watcher = ClientInfo {
            client_id: "c".to_string(),
            user_id: r.renter_id,
            subscribed_rentals: vec![r.id],
        };

        assert!(owner.wants(&event));
        assert!(!stranger.wants(&event));
        assert!(watcher.wants(&event));
    }

    #[test]
    fn test_only_parties_may_watch_a_rental() {
        let r = rental(RentalStatus::Active);
        let user = |user_id, role| AuthenticatedUser {
            user_id,
            username: "asha".to_string(),
            role,
        };

        assert!(may_watch(&r, &user(r.renter_id, UserRole::User)));
        assert!(may_watch(&r, &user(r.owner_id, UserRole::User)));
        assert!(may_watch(&r, &user(Uuid::new_v4(), UserRole::Admin)));
        assert!(!may_watch(&r, &user(Uuid::new_v4(), UserRole::User)));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_subscriber() {
        let state = WsState::new();
        let mut rx = state.tx.subscribe();
        let r = rental(RentalStatus::Active);

        state
            .broadcast_event(RentalEvent::new(&r, RentalEventKind::ReturnRequested))
            .await;

        let got = rx.recv().await.unwrap();
        assert_eq!(got.rental_id, r.id);
    }
}
