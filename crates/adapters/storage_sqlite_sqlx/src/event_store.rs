//! `SQLite` implementation of [`EventStore`].
//!
//! The log is bounded: each insert prunes everything past `capacity`,
//! oldest first. Insertion order (`rowid`) decides what is newest.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use modhub_app::ports::EventStore;
use modhub_domain::error::ModHubError;
use modhub_domain::event::{Event, EventType};
use modhub_domain::id::{EventId, RuleId};

use crate::codec::{decode_id, decode_json, decode_timestamp, encode_timestamp};
use crate::error::StorageError;

struct Wrapper(Event);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let event_type: String = row.try_get("event_type")?;
        let rule_id: Option<String> = row.try_get("rule_id")?;
        let timestamp: String = row.try_get("timestamp")?;
        let data: String = row.try_get("data")?;

        let event_type: EventType = serde_json::from_value(serde_json::Value::String(event_type))
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(Event {
            id: decode_id(&id)?,
            event_type,
            rule_id: rule_id.as_deref().map(decode_id).transpose()?,
            data: decode_json(&data)?,
            timestamp: decode_timestamp(&timestamp)?,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO events (id, event_type, rule_id, timestamp, data)
    VALUES (?, ?, ?, ?, ?)
";

const PRUNE: &str = r"
    DELETE FROM events
    WHERE rowid NOT IN (SELECT rowid FROM events ORDER BY rowid DESC LIMIT ?)
";

const SELECT_RECENT: &str = "SELECT * FROM events ORDER BY rowid DESC LIMIT ?";
const SELECT_BY_RULE: &str = "SELECT * FROM events WHERE rule_id = ? ORDER BY rowid DESC LIMIT ?";

/// `SQLite`-backed bounded event log.
pub struct SqliteEventStore {
    pool: SqlitePool,
    capacity: usize,
}

impl SqliteEventStore {
    /// Create a log keeping at most `capacity` events (at least one).
    #[must_use]
    pub fn new(pool: SqlitePool, capacity: usize) -> Self {
        Self {
            pool,
            capacity: capacity.max(1),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

impl EventStore for SqliteEventStore {
    async fn store(&self, event: Event) -> Result<Event, ModHubError> {
        let data = serde_json::to_string(&event.data).map_err(StorageError::from)?;
        let mut tx = self.pool.begin().await.map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(event.id.to_string())
            .bind(event.event_type.to_string())
            .bind(event.rule_id.map(|id| id.to_string()))
            .bind(encode_timestamp(event.timestamp))
            .bind(data)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;

        sqlx::query(PRUNE)
            .bind(sql_limit(self.capacity))
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;

        tx.commit().await.map_err(StorageError::from)?;
        Ok(event)
    }

    async fn get_by_id(&self, id: EventId) -> Result<Option<Event>, ModHubError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM events WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(row.map(|w| w.0))
    }

    async fn get_recent(&self, limit: usize) -> Result<Vec<Event>, ModHubError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_RECENT)
            .bind(sql_limit(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn find_by_rule(&self, rule_id: RuleId, limit: usize) -> Result<Vec<Event>, ModHubError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_RULE)
            .bind(rule_id.to_string())
            .bind(sql_limit(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use serde_json::json;

    async fn setup(capacity: usize) -> SqliteEventStore {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteEventStore::new(db.pool().clone(), capacity)
    }

    fn event(event_type: EventType, rule_id: Option<RuleId>) -> Event {
        Event::new(event_type, rule_id, json!({"mod": "Gaming Mod"}))
    }

    #[tokio::test]
    async fn should_store_and_retrieve_event_by_id() {
        let store = setup(10).await;
        let stored = store
            .store(event(EventType::ModActivated, Some(RuleId::new())))
            .await
            .unwrap();

        let fetched = store.get_by_id(stored.id).await.unwrap();

        assert_eq!(fetched, Some(stored));
    }

    #[tokio::test]
    async fn should_return_recent_events_newest_first() {
        let store = setup(10).await;
        let first = store.store(event(EventType::RuleTriggered, None)).await.unwrap();
        let second = store.store(event(EventType::ModActivated, None)).await.unwrap();
        let third = store.store(event(EventType::RuleReleased, None)).await.unwrap();

        let recent = store.get_recent(2).await.unwrap();

        assert_eq!(recent, vec![third, second]);
        assert!(store.get_recent(10).await.unwrap().contains(&first));
    }

    #[tokio::test]
    async fn should_evict_oldest_event_when_full() {
        let store = setup(2).await;
        let oldest = store.store(event(EventType::RuleTriggered, None)).await.unwrap();
        store.store(event(EventType::ModActivated, None)).await.unwrap();
        store.store(event(EventType::RuleReleased, None)).await.unwrap();

        assert_eq!(store.get_recent(10).await.unwrap().len(), 2);
        assert!(store.get_by_id(oldest.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_find_events_by_rule() {
        let store = setup(10).await;
        let rule_id = RuleId::new();
        store.store(event(EventType::RuleTriggered, Some(rule_id))).await.unwrap();
        store.store(event(EventType::ModActivated, Some(RuleId::new()))).await.unwrap();
        store.store(event(EventType::RuleFailed, Some(rule_id))).await.unwrap();

        let found = store.find_by_rule(rule_id, 10).await.unwrap();

        let types: Vec<EventType> = found.iter().map(|e| e.event_type).collect();
        assert_eq!(types, vec![EventType::RuleFailed, EventType::RuleTriggered]);
    }
}
