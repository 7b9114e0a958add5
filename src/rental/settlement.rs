//! Background settlement of returned rentals

use std::sync::Arc;
use std::time::Duration;

use super::{RentalEvent, RentalEventKind, RentalService};
use crate::websocket::WsState;

/// Periodically complete rentals whose item is back with the seller,
/// releasing deposits and crediting owners.
pub async fn settlement_loop(rental_service: Arc<RentalService>, ws_state: WsState, interval: Duration) {
    tracing::info!(interval_secs = interval.as_secs(), "Starting settlement loop");

    loop {
        tokio::time::sleep(interval).await;

        match rental_service.settle_returned().await {
            Ok(settled) => {
                for rental in settled {
                    tracing::info!("Rental {} settled", rental.id);
                    let event = RentalEvent::new(
                        &rental,
                        RentalEventKind::StatusUpdated {
                            status: rental.status,
                        },
                    );
                    ws_state.broadcast_event(event).await;
                }
            }
            Err(e) => {
                tracing::error!("Error settling returned rentals: {}", e);
            }
        }
    }
}
