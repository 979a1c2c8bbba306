use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted by booking operations.
///
/// Consumers (notification fan-out, report invalidation) subscribe via the
/// receiving half of the channel; the engine itself never blocks on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ReservationCreated(i64),
    ReservationUpdated(i64),
    ReservationDeleted(i64),
    PaymentRecorded {
        reservation_id: i64,
        amount: Decimal,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Convenience constructor for an event channel pair.
pub fn channel(capacity: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender::new(tx), rx)
}
