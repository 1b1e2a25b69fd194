//! Domain event publishing over NATS.
//!
//! Publishing is best effort. Events are emitted after the owning transaction
//! commits, and a failed publish never fails the request.

use crate::domain::events::DomainEvent;

#[derive(Clone, Debug, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    /// Publisher that only logs.
    pub fn disabled() -> Self { Self::default() }

    pub async fn publish(&self, event: DomainEvent) {
        let subject = event.subject();
        let Some(client) = &self.nats else {
            tracing::debug!(subject, ?event, "event publishing disabled");
            return;
        };
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(subject, error = %e, "failed to encode domain event");
                return;
            }
        };
        if let Err(e) = client.publish(subject.to_string(), payload.into()).await {
            tracing::warn!(subject, error = %e, "failed to publish domain event");
        }
    }

    pub async fn publish_all(&self, events: impl IntoIterator<Item = DomainEvent>) {
        for event in events { self.publish(event).await; }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::{OrderEvent, SaleEvent};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_disabled_publisher_is_noop() {
        let publisher = EventPublisher::disabled();
        publisher.publish(DomainEvent::Sale(SaleEvent::Recorded { sale_id: Uuid::now_v7(), amount: 10 })).await;
        publisher.publish_all(Vec::new()).await;
    }

    #[test]
    fn test_event_encoding() {
        let id = Uuid::nil();
        let event = DomainEvent::Order(OrderEvent::Created { order_id: id, customer_id: id, guest: true });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "order");
        assert_eq!(json["event"], "created");
        assert_eq!(json["guest"], true);
        assert_eq!(event.subject(), "storefront.orders.created");
    }
}
