//! Rule repository port — persistence for rules.
//!
//! A stored rule has two owners. The rule service edits its definition
//! through [`RuleRepository::update`]; the engine writes its run state
//! through [`RuleRepository::set_run_state`]. Neither write clobbers the
//! other's fields.

use std::future::Future;
use std::sync::Arc;

use modhub_domain::error::ModHubError;
use modhub_domain::id::RuleId;
use modhub_domain::rule::{Rule, RunState};

/// Repository for persisting and querying [`Rule`]s.
pub trait RuleRepository {
    /// Create a new rule in storage.
    fn create(&self, rule: Rule) -> impl Future<Output = Result<Rule, ModHubError>> + Send;

    /// Get a rule by its unique identifier.
    fn get_by_id(
        &self,
        id: RuleId,
    ) -> impl Future<Output = Result<Option<Rule>, ModHubError>> + Send;

    /// Get all rules.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Rule>, ModHubError>> + Send;

    /// Replace an existing rule's definition.
    ///
    /// `is_running` and `last_triggered` keep their stored values; the
    /// returned rule carries them.
    ///
    /// Returns [`ModHubError::NotFound`] when no rule has the same id.
    fn update(&self, rule: Rule) -> impl Future<Output = Result<Rule, ModHubError>> + Send;

    /// Change only the engine-owned fields of a stored rule.
    ///
    /// Returns [`ModHubError::NotFound`] when no rule has this id.
    fn set_run_state(
        &self,
        id: RuleId,
        state: RunState,
    ) -> impl Future<Output = Result<Rule, ModHubError>> + Send;

    /// Delete a rule by its unique identifier.
    fn delete(&self, id: RuleId) -> impl Future<Output = Result<(), ModHubError>> + Send;
}

impl<T: RuleRepository + Send + Sync> RuleRepository for Arc<T> {
    fn create(&self, rule: Rule) -> impl Future<Output = Result<Rule, ModHubError>> + Send {
        (**self).create(rule)
    }

    fn get_by_id(
        &self,
        id: RuleId,
    ) -> impl Future<Output = Result<Option<Rule>, ModHubError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Rule>, ModHubError>> + Send {
        (**self).get_all()
    }

    fn update(&self, rule: Rule) -> impl Future<Output = Result<Rule, ModHubError>> + Send {
        (**self).update(rule)
    }

    fn set_run_state(
        &self,
        id: RuleId,
        state: RunState,
    ) -> impl Future<Output = Result<Rule, ModHubError>> + Send {
        (**self).set_run_state(id, state)
    }

    fn delete(&self, id: RuleId) -> impl Future<Output = Result<(), ModHubError>> + Send {
        (**self).delete(id)
    }
}
