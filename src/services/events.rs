//! Fire-and-forget publication of domain events over NATS.

use crate::domain::events::DomainEvent;

#[derive(Clone, Default)]
pub struct EventBus {
    nats: Option<async_nats::Client>,
}

impl EventBus {
    pub fn nats(client: async_nats::Client) -> Self {
        Self { nats: Some(client) }
    }

    pub fn disabled() -> Self {
        Self { nats: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.nats.is_some()
    }

    /// Never fails the caller; publish errors are only logged.
    pub async fn publish(&self, event: impl Into<DomainEvent>) {
        let Some(client) = &self.nats else { return };
        let event = event.into();
        let subject = event.subject();
        let payload = match serde_json::to_vec(&event) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(subject, error = %e, "failed to encode event");
                return;
            }
        };
        if let Err(e) = client.publish(subject.to_string(), payload.into()).await {
            tracing::warn!(subject, error = %e, "failed to publish event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::OrderEvent;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[tokio::test]
    async fn disabled_bus_is_a_no_op() {
        let bus = EventBus::disabled();
        assert!(!bus.is_enabled());
        bus.publish(OrderEvent::Recorded { order_id: Uuid::new_v4(), user_id: Uuid::new_v4(), total: Decimal::ONE }).await;
    }

    #[test]
    fn events_encode_with_type_tag() {
        let event = DomainEvent::from(OrderEvent::Recorded { order_id: Uuid::nil(), user_id: Uuid::nil(), total: Decimal::new(5, 0) });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "recorded");
        assert_eq!(event.subject(), "sweetshop.order.recorded");
    }
}
