//! Event store port — persistence for domain events.

use std::future::Future;
use std::sync::Arc;

use modhub_domain::error::ModHubError;
use modhub_domain::event::Event;
use modhub_domain::id::{EventId, RuleId};

/// Repository for persisting and querying [`Event`]s.
pub trait EventStore {
    /// Persist a new event.
    fn store(&self, event: Event) -> impl Future<Output = Result<Event, ModHubError>> + Send;

    /// Get an event by its unique identifier.
    fn get_by_id(
        &self,
        id: EventId,
    ) -> impl Future<Output = Result<Option<Event>, ModHubError>> + Send;

    /// Get the most recent events, ordered newest-first.
    fn get_recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Event>, ModHubError>> + Send;

    /// Find events caused by a specific rule, ordered newest-first.
    fn find_by_rule(
        &self,
        rule_id: RuleId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Event>, ModHubError>> + Send;
}

impl<T: EventStore + Send + Sync> EventStore for Arc<T> {
    fn store(&self, event: Event) -> impl Future<Output = Result<Event, ModHubError>> + Send {
        (**self).store(event)
    }

    fn get_by_id(
        &self,
        id: EventId,
    ) -> impl Future<Output = Result<Option<Event>, ModHubError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Event>, ModHubError>> + Send {
        (**self).get_recent(limit)
    }

    fn find_by_rule(
        &self,
        rule_id: RuleId,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Event>, ModHubError>> + Send {
        (**self).find_by_rule(rule_id, limit)
    }
}
