//! In-memory implementation of [`RuleRepository`].

use std::collections::BTreeMap;
use std::sync::RwLock;

use modhub_app::ports::RuleRepository;
use modhub_domain::error::{ModHubError, NotFoundError};
use modhub_domain::id::RuleId;
use modhub_domain::rule::{Rule, RunState};

use crate::error::StorageError;

/// Rules keyed by id; listings come back in id order.
#[derive(Debug, Default)]
pub struct MemoryRuleRepository {
    rules: RwLock<BTreeMap<RuleId, Rule>>,
}

impl MemoryRuleRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

const POISONED: StorageError = StorageError::Poisoned("rule");

fn not_found(id: RuleId) -> ModHubError {
    NotFoundError {
        entity: "Rule",
        id: id.to_string(),
    }
    .into()
}

impl RuleRepository for MemoryRuleRepository {
    async fn create(&self, rule: Rule) -> Result<Rule, ModHubError> {
        let mut rules = self.rules.write().map_err(|_| POISONED)?;
        if rules.contains_key(&rule.id) {
            return Err(StorageError::Duplicate {
                entity: "Rule",
                id: rule.id.to_string(),
            }
            .into());
        }
        rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    async fn get_by_id(&self, id: RuleId) -> Result<Option<Rule>, ModHubError> {
        let rules = self.rules.read().map_err(|_| POISONED)?;
        Ok(rules.get(&id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Rule>, ModHubError> {
        let rules = self.rules.read().map_err(|_| POISONED)?;
        Ok(rules.values().cloned().collect())
    }

    async fn update(&self, mut rule: Rule) -> Result<Rule, ModHubError> {
        let mut rules = self.rules.write().map_err(|_| POISONED)?;
        let slot = rules.get_mut(&rule.id).ok_or_else(|| not_found(rule.id))?;
        rule.is_running = slot.is_running;
        rule.last_triggered = slot.last_triggered;
        *slot = rule.clone();
        Ok(rule)
    }

    async fn set_run_state(&self, id: RuleId, state: RunState) -> Result<Rule, ModHubError> {
        let mut rules = self.rules.write().map_err(|_| POISONED)?;
        let slot = rules.get_mut(&id).ok_or_else(|| not_found(id))?;
        state.apply_to(slot);
        Ok(slot.clone())
    }

    async fn delete(&self, id: RuleId) -> Result<(), ModHubError> {
        let mut rules = self.rules.write().map_err(|_| POISONED)?;
        rules.remove(&id);
        Ok(())
    }
}
