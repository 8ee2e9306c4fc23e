use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::entities::{service_order::ServiceOrderStatus, stock_movement::MovementType};
use crate::notifications::{Notification, NotificationError, Notifier};

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

    /// Sends an event after a commit. A closed channel is logged and otherwise ignored.
    pub async fn publish(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            counter!("taller_events.dropped", 1);
            warn!("{}", e);
        }
    }
}

/// Domain events published after the owning transaction commits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Event {
    StockAdjusted {
        item_id: i32,
        movement_id: i32,
        movement_type: MovementType,
        quantity: i32,
        new_stock: i32,
    },
    LowStock {
        item_id: i32,
        code: String,
        stock: i32,
        minimum: i32,
    },
    ServiceOrderStatusChanged {
        order_id: i32,
        from: ServiceOrderStatus,
        to: ServiceOrderStatus,
    },
    ServiceOrderFinalized {
        order_id: i32,
        customer_email: String,
        customer_name: String,
        vehicle: String,
    },
    PurchaseOrderReceived {
        purchase_order_id: i32,
        lines_received: usize,
    },
}

/// Consumes events until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, notifier: Arc<dyn Notifier>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        counter!("taller_events.processed", 1);
        match event {
            Event::StockAdjusted {
                item_id,
                movement_id,
                movement_type,
                quantity,
                new_stock,
            } => {
                info!(
                    item_id,
                    movement_id,
                    movement_type = %movement_type,
                    quantity,
                    new_stock,
                    "stock adjusted"
                );
            }
            Event::LowStock {
                item_id,
                code,
                stock,
                minimum,
            } => {
                warn!(item_id, code = %code, stock, minimum, "item at or below minimum stock");
            }
            Event::ServiceOrderStatusChanged { order_id, from, to } => {
                info!(order_id, from = %from, to = %to, "service order status changed");
            }
            Event::ServiceOrderFinalized {
                order_id,
                customer_email,
                customer_name,
                vehicle,
            } => {
                if let Err(e) = handle_vehicle_ready(
                    notifier.as_ref(),
                    order_id,
                    &customer_email,
                    &customer_name,
                    &vehicle,
                )
                .await
                {
                    counter!("taller_notifications.failed", 1);
                    error!(
                        "Failed to send vehicle ready notification: order_id={}, error={}",
                        order_id, e
                    );
                }
            }
            Event::PurchaseOrderReceived {
                purchase_order_id,
                lines_received,
            } => {
                info!(purchase_order_id, lines_received, "purchase order received");
            }
        }
    }

    info!("Event processing loop stopped");
}

async fn handle_vehicle_ready(
    notifier: &dyn Notifier,
    order_id: i32,
    customer_email: &str,
    customer_name: &str,
    vehicle: &str,
) -> Result<(), NotificationError> {
    let notification =
        Notification::vehicle_ready(customer_email, customer_name, order_id, vehicle);
    notifier.send(&notification).await?;
    counter!("taller_notifications.sent", 1);
    info!(order_id, recipient = %customer_email, "vehicle ready notification sent");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::MemoryNotifier;

    #[tokio::test]
    async fn finalized_order_triggers_notification() {
        let notifier = Arc::new(MemoryNotifier::default());
        let (tx, rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        let handle = tokio::spawn(process_events(rx, notifier.clone()));

        sender
            .publish(Event::ServiceOrderFinalized {
                order_id: 9,
                customer_email: "luis@example.com".into(),
                customer_name: "Luis".into(),
                vehicle: "Ford Fiesta".into(),
            })
            .await;
        drop(sender);
        handle.await.unwrap();

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "luis@example.com");
    }

    #[tokio::test]
    async fn failed_delivery_does_not_stop_the_loop() {
        let mut notifier = crate::notifications::MockNotifier::new();
        notifier
            .expect_send()
            .times(2)
            .returning(|_| Err(NotificationError::Rejected(502)));

        let (tx, rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        let handle = tokio::spawn(process_events(rx, Arc::new(notifier)));

        for order_id in [1, 2] {
            sender
                .publish(Event::ServiceOrderFinalized {
                    order_id,
                    customer_email: "ana@example.com".into(),
                    customer_name: "Ana".into(),
                    vehicle: "Nissan Versa".into(),
                })
                .await;
        }
        drop(sender);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn publish_on_closed_channel_does_not_panic() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        EventSender::new(tx)
            .publish(Event::PurchaseOrderReceived {
                purchase_order_id: 1,
                lines_received: 0,
            })
            .await;
    }
}
