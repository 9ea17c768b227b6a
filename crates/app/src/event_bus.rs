//! In-process event bus backed by a tokio broadcast channel, and the
//! recorder that persists what flows through it.

use std::future::Future;

use tokio::sync::broadcast;

use modhub_domain::error::ModHubError;
use modhub_domain::event::Event;

use crate::ports::{EventPublisher, EventStore};

/// In-process event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped).
#[derive(Clone)]
pub struct InProcessEventBus {
    sender: broadcast::Sender<Event>,
}

impl InProcessEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events on this bus.
    ///
    /// Returns a receiver that will get all events published *after*
    /// the subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), ModHubError>> + Send {
        // send fails only when there are zero receivers
        let _ = self.sender.send(event);
        async { Ok(()) }
    }
}

/// Persist every event received on `rx` into `store` until the bus closes.
///
/// A lagging recorder loses the overwritten events and keeps going; a
/// failing store is logged and the event dropped.
pub async fn record_events<S: EventStore>(mut rx: broadcast::Receiver<Event>, store: S) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                let event_id = event.id;
                if let Err(err) = store.store(event).await {
                    tracing::warn!(%event_id, error = %err, "failed to record event");
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event recorder lagged behind the bus");
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::debug!("event bus closed, recorder stopping");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modhub_domain::event::EventType;
    use modhub_domain::id::{EventId, RuleId};
    use std::sync::Mutex;

    #[derive(Default)]
    struct VecEventStore {
        events: Mutex<Vec<Event>>,
    }

    impl EventStore for &VecEventStore {
        fn store(&self, event: Event) -> impl Future<Output = Result<Event, ModHubError>> + Send {
            self.events.lock().unwrap().push(event.clone());
            async { Ok(event) }
        }

        fn get_by_id(
            &self,
            id: EventId,
        ) -> impl Future<Output = Result<Option<Event>, ModHubError>> + Send {
            let r = self
                .events
                .lock()
                .unwrap()
                .iter()
                .find(|e| e.id == id)
                .cloned();
            async { Ok(r) }
        }

        fn get_recent(
            &self,
            limit: usize,
        ) -> impl Future<Output = Result<Vec<Event>, ModHubError>> + Send {
            let r: Vec<_> = self
                .events
                .lock()
                .unwrap()
                .iter()
                .rev()
                .take(limit)
                .cloned()
                .collect();
            async { Ok(r) }
        }

        fn find_by_rule(
            &self,
            rule_id: RuleId,
            limit: usize,
        ) -> impl Future<Output = Result<Vec<Event>, ModHubError>> + Send {
            let r: Vec<_> = self
                .events
                .lock()
                .unwrap()
                .iter()
                .rev()
                .filter(|e| e.rule_id == Some(rule_id))
                .take(limit)
                .cloned()
                .collect();
            async { Ok(r) }
        }
    }

    #[tokio::test]
    async fn should_deliver_event_to_subscriber() {
        let bus = InProcessEventBus::new(16);
        let mut rx = bus.subscribe();

        let event = Event::new(
            EventType::RuleTriggered,
            Some(RuleId::new()),
            serde_json::json!({"name": "Gaming"}),
        );
        let event_id = event.id;

        bus.publish(event).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, event_id);
    }

    #[tokio::test]
    async fn should_deliver_event_to_multiple_subscribers() {
        let bus = InProcessEventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let event = Event::new(EventType::ModActivated, None, serde_json::json!({}));
        let event_id = event.id;

        bus.publish(event).await.unwrap();

        assert_eq!(rx1.recv().await.unwrap().id, event_id);
        assert_eq!(rx2.recv().await.unwrap().id, event_id);
    }

    #[tokio::test]
    async fn should_succeed_when_no_subscribers() {
        let bus = InProcessEventBus::new(16);
        let event = Event::new(EventType::RuleReleased, None, serde_json::json!({}));
        assert!(bus.publish(event).await.is_ok());
    }

    #[tokio::test]
    async fn should_record_events_until_bus_closes() {
        let store = VecEventStore::default();
        let bus = InProcessEventBus::new(16);
        let rx = bus.subscribe();

        for event_type in [EventType::RuleTriggered, EventType::ModActivated] {
            bus.publish(Event::new(event_type, None, serde_json::Value::Null))
                .await
                .unwrap();
        }
        drop(bus);

        record_events(rx, &store).await;

        let recent = (&store).get_recent(10).await.unwrap();
        let types: Vec<EventType> = recent.iter().map(|e| e.event_type).collect();
        assert_eq!(types, vec![EventType::ModActivated, EventType::RuleTriggered]);
    }

    #[tokio::test]
    async fn should_keep_recording_after_lagging() {
        let store = VecEventStore::default();
        let bus = InProcessEventBus::new(2);
        let rx = bus.subscribe();

        for _ in 0..5 {
            bus.publish(Event::new(
                EventType::CommandRequested,
                None,
                serde_json::Value::Null,
            ))
            .await
            .unwrap();
        }
        drop(bus);

        record_events(rx, &store).await;

        assert_eq!(store.events.lock().unwrap().len(), 2);
    }
}
