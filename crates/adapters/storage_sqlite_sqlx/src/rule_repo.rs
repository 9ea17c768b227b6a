//! `SQLite` implementation of [`RuleRepository`].
//!
//! Definition edits and run-state changes are single `UPDATE … RETURNING`
//! statements touching disjoint columns, so neither can revert the other.

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use modhub_app::ports::RuleRepository;
use modhub_domain::error::{ModHubError, NotFoundError};
use modhub_domain::id::RuleId;
use modhub_domain::rule::{Action, Condition, Rule, RunState};

use crate::codec::{decode_id, decode_json, decode_timestamp, encode_timestamp};
use crate::error::StorageError;

struct Wrapper(Rule);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Rule> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let description: Option<String> = row.try_get("description")?;
        let enabled: bool = row.try_get("enabled")?;
        let priority: i32 = row.try_get("priority")?;
        let conditions_json: String = row.try_get("conditions")?;
        let actions_json: String = row.try_get("actions")?;
        let last_triggered: Option<String> = row.try_get("last_triggered")?;
        let is_running: bool = row.try_get("is_running")?;

        let conditions: Vec<Condition> = decode_json(&conditions_json)?;
        let actions: Vec<Action> = decode_json(&actions_json)?;

        Ok(Self(Rule {
            id: decode_id(&id)?,
            name,
            description,
            enabled,
            priority,
            conditions,
            actions,
            last_triggered: last_triggered.as_deref().map(decode_timestamp).transpose()?,
            is_running,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO rules (id, name, description, enabled, priority, conditions, actions, last_triggered, is_running)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const UPDATE_DEFINITION: &str = r"
    UPDATE rules
    SET name = ?, description = ?, enabled = ?, priority = ?, conditions = ?, actions = ?
    WHERE id = ?
    RETURNING *
";

const UPDATE_RUN_STATE: &str = r"
    UPDATE rules
    SET is_running = COALESCE(?, is_running), last_triggered = COALESCE(?, last_triggered)
    WHERE id = ?
    RETURNING *
";

const SELECT_BY_ID: &str = "SELECT * FROM rules WHERE id = ?";
const SELECT_ALL: &str = "SELECT * FROM rules ORDER BY id";
const DELETE: &str = "DELETE FROM rules WHERE id = ?";

fn not_found(id: RuleId) -> ModHubError {
    NotFoundError {
        entity: "Rule",
        id: id.to_string(),
    }
    .into()
}

/// `SQLite`-backed rule repository.
pub struct SqliteRuleRepository {
    pool: SqlitePool,
}

impl SqliteRuleRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RuleRepository for SqliteRuleRepository {
    async fn create(&self, rule: Rule) -> Result<Rule, ModHubError> {
        let conditions_json = serde_json::to_string(&rule.conditions).map_err(StorageError::from)?;
        let actions_json = serde_json::to_string(&rule.actions).map_err(StorageError::from)?;

        sqlx::query(INSERT)
            .bind(rule.id.to_string())
            .bind(&rule.name)
            .bind(&rule.description)
            .bind(rule.enabled)
            .bind(rule.priority)
            .bind(&conditions_json)
            .bind(&actions_json)
            .bind(rule.last_triggered.map(encode_timestamp))
            .bind(rule.is_running)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(rule)
    }

    async fn get_by_id(&self, id: RuleId) -> Result<Option<Rule>, ModHubError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Rule>, ModHubError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, rule: Rule) -> Result<Rule, ModHubError> {
        let conditions_json = serde_json::to_string(&rule.conditions).map_err(StorageError::from)?;
        let actions_json = serde_json::to_string(&rule.actions).map_err(StorageError::from)?;

        let row: Option<Wrapper> = sqlx::query_as(UPDATE_DEFINITION)
            .bind(&rule.name)
            .bind(&rule.description)
            .bind(rule.enabled)
            .bind(rule.priority)
            .bind(&conditions_json)
            .bind(&actions_json)
            .bind(rule.id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Wrapper::maybe(row).ok_or_else(|| not_found(rule.id))
    }

    async fn set_run_state(&self, id: RuleId, state: RunState) -> Result<Rule, ModHubError> {
        let row: Option<Wrapper> = sqlx::query_as(UPDATE_RUN_STATE)
            .bind(state.is_running)
            .bind(state.last_triggered.map(encode_timestamp))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Wrapper::maybe(row).ok_or_else(|| not_found(id))
    }

    async fn delete(&self, id: RuleId) -> Result<(), ModHubError> {
        sqlx::query(DELETE)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use modhub_domain::rule::{ProcessOperation, TimeWindow};
    use modhub_domain::time::now;

    async fn setup() -> SqliteRuleRepository {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteRuleRepository::new(db.pool().clone())
    }

    fn gaming_rule() -> Rule {
        Rule::builder()
            .name("Gaming")
            .priority(10)
            .condition(Condition::Process {
                operation: ProcessOperation::Running,
                process: "game.exe".to_string(),
            })
            .action(Action::ActivateMod {
                target: "Gaming Mod".to_string(),
            })
            .build()
    }

    #[tokio::test]
    async fn should_create_and_retrieve_rule() {
        let repo = setup().await;
        let rule = gaming_rule();
        let id = rule.id;

        repo.create(rule.clone()).await.unwrap();
        let fetched = repo.get_by_id(id).await.unwrap().unwrap();

        assert_eq!(fetched, rule);
    }

    #[tokio::test]
    async fn should_return_none_when_rule_not_found() {
        let repo = setup().await;
        assert!(repo.get_by_id(RuleId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn should_reject_duplicate_id() {
        let repo = setup().await;
        let rule = gaming_rule();
        repo.create(rule.clone()).await.unwrap();
        assert!(matches!(
            repo.create(rule).await,
            Err(ModHubError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn should_preserve_conditions_and_actions_through_roundtrip() {
        let repo = setup().await;
        let rule = Rule::builder()
            .name("Night")
            .description("Dim everything")
            .condition(Condition::Time(TimeWindow::Between {
                start: "22:00".parse().unwrap(),
                end: "06:00".parse().unwrap(),
            }))
            .condition(Condition::Inactivity {
                threshold_minutes: 15,
            })
            .action(Action::AdjustSetting {
                target: "brightness".to_string(),
                value: serde_json::json!({"level": 20}),
            })
            .action(Action::Notify {
                target: "desktop".to_string(),
                value: Some(serde_json::json!("Good night")),
            })
            .build();
        let id = rule.id;

        repo.create(rule.clone()).await.unwrap();

        assert_eq!(repo.get_by_id(id).await.unwrap().unwrap(), rule);
    }

    #[tokio::test]
    async fn should_list_rules_in_id_order() {
        let repo = setup().await;
        repo.create(gaming_rule()).await.unwrap();
        repo.create(gaming_rule()).await.unwrap();

        let all = repo.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].id < all[1].id);
    }

    #[tokio::test]
    async fn should_keep_run_state_when_definition_is_replaced() {
        let repo = setup().await;
        let rule = gaming_rule();
        let id = rule.id;
        repo.create(rule.clone()).await.unwrap();
        repo.set_run_state(id, RunState::triggered(now()))
            .await
            .unwrap();

        let mut edited = rule;
        edited.name = "Renamed".to_string();
        edited.enabled = false;
        let saved = repo.update(edited).await.unwrap();

        assert!(saved.is_running);
        assert!(saved.last_triggered.is_some());
        let stored = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Renamed");
        assert!(!stored.enabled);
        assert!(stored.is_running);
    }

    #[tokio::test]
    async fn should_change_only_run_state() {
        let repo = setup().await;
        let rule = gaming_rule();
        let id = rule.id;
        repo.create(rule).await.unwrap();
        let fired_at = repo
            .set_run_state(id, RunState::triggered(now()))
            .await
            .unwrap()
            .last_triggered;

        let released = repo.set_run_state(id, RunState::released()).await.unwrap();

        assert!(!released.is_running);
        assert_eq!(released.last_triggered, fired_at);
        assert_eq!(released.name, "Gaming");
    }

    #[tokio::test]
    async fn should_return_not_found_for_missing_rule() {
        let repo = setup().await;
        assert!(matches!(
            repo.update(gaming_rule()).await,
            Err(ModHubError::NotFound(_))
        ));
        assert!(matches!(
            repo.set_run_state(RuleId::new(), RunState::released()).await,
            Err(ModHubError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn should_delete_rule() {
        let repo = setup().await;
        let rule = gaming_rule();
        let id = rule.id;
        repo.create(rule).await.unwrap();

        repo.delete(id).await.unwrap();

        assert!(repo.get_by_id(id).await.unwrap().is_none());
    }
}
