//! In-memory implementation of [`EventStore`].
//!
//! The log is bounded: once full, the oldest event is evicted.

use std::collections::VecDeque;
use std::sync::RwLock;

use modhub_app::ports::EventStore;
use modhub_domain::error::ModHubError;
use modhub_domain::event::Event;
use modhub_domain::id::{EventId, RuleId};

use crate::error::StorageError;

/// Bounded event log, oldest first internally.
#[derive(Debug)]
pub struct MemoryEventStore {
    capacity: usize,
    events: RwLock<VecDeque<Event>>,
}

impl MemoryEventStore {
    /// Create a log keeping at most `capacity` events (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: RwLock::new(VecDeque::with_capacity(capacity)),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

const POISONED: StorageError = StorageError::Poisoned("event");

impl EventStore for MemoryEventStore {
    async fn store(&self, event: Event) -> Result<Event, ModHubError> {
        let mut events = self.events.write().map_err(|_| POISONED)?;
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event.clone());
        Ok(event)
    }

    async fn get_by_id(&self, id: EventId) -> Result<Option<Event>, ModHubError> {
        let events = self.events.read().map_err(|_| POISONED)?;
        Ok(events.iter().find(|e| e.id == id).cloned())
    }

    async fn get_recent(&self, limit: usize) -> Result<Vec<Event>, ModHubError> {
        let events = self.events.read().map_err(|_| POISONED)?;
        Ok(events.iter().rev().take(limit).cloned().collect())
    }

    async fn find_by_rule(&self, rule_id: RuleId, limit: usize) -> Result<Vec<Event>, ModHubError> {
        let events = self.events.read().map_err(|_| POISONED)?;
        Ok(events
            .iter()
            .rev()
            .filter(|e| e.rule_id == Some(rule_id))
            .take(limit)
            .cloned()
            .collect())
    }
}
