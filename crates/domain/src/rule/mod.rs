//! Rule — condition → action automations.
//!
//! A [`Rule`] fires when **all** of its [`Condition`]s hold against a
//! [`SystemSnapshot`](crate::snapshot::SystemSnapshot), requesting its
//! [`Action`]s. Several satisfied rules are ordered by priority, and the
//! first one in that order wins any resource they compete for.
//!
//! - [`condition`]: the condition sum type and its wire record
//! - [`evaluator`]: evaluation of wire-form conditions, custom predicates
//! - [`matcher`]: rule satisfaction and priority ordering
//! - [`validation`]: construction-time issues and normalization
//! - [`dispatch`]: conflict resolution between satisfied rules
//! - [`ingest`]: batch conversion of wire rules, skipping bad ones

mod action;
pub mod condition;
pub mod dispatch;
pub mod evaluator;
pub mod ingest;
pub mod matcher;
pub mod validation;

pub use action::{Action, ConflictKey};
pub use condition::{Condition, ConditionRecord, ProcessOperation, TimeWindow};
pub use dispatch::{DispatchPlan, PlannedAction, SuppressedAction, plan_dispatch};
pub use evaluator::{CustomPredicate, NoCustomPredicate, StaticCustomPredicate, evaluate};
pub use ingest::{ParsedRules, RuleIngestError, SkippedRule, parse_rules};
pub use matcher::{ConditionResult, RuleEvaluation, explain, find_triggered_rules, precedence};
pub use validation::{
    IssueCode, Severity, ValidationIssue, ValidationPolicy, has_errors, normalize,
};

use serde::{Deserialize, Serialize};

use crate::error::InvalidConditionError;
use crate::id::RuleId;
use crate::time::Timestamp;

/// An automation pairing conditions with actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RuleRecord")]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
    /// Higher fires first.
    pub priority: i32,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
    pub last_triggered: Option<Timestamp>,
    /// Set while the rule's conditions keep holding after it fired.
    pub is_running: bool,
}

impl Rule {
    /// Create a builder for constructing a [`Rule`].
    #[must_use]
    pub fn builder() -> RuleBuilder {
        RuleBuilder::default()
    }
}

/// A change to the fields the engine owns on a stored rule.
///
/// `None` keeps the stored value. Definition edits never touch these
/// fields, and the engine never touches anything else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    pub is_running: Option<bool>,
    pub last_triggered: Option<Timestamp>,
}

impl RunState {
    /// The rule fired at `at` and runs until its conditions stop holding.
    #[must_use]
    pub fn triggered(at: Timestamp) -> Self {
        Self {
            is_running: Some(true),
            last_triggered: Some(at),
        }
    }

    /// The rule's conditions stopped holding.
    #[must_use]
    pub fn released() -> Self {
        Self {
            is_running: Some(false),
            last_triggered: None,
        }
    }

    /// The rule was run by hand at `at`.
    #[must_use]
    pub fn ran(at: Timestamp) -> Self {
        Self {
            is_running: None,
            last_triggered: Some(at),
        }
    }

    pub fn apply_to(self, rule: &mut Rule) {
        if let Some(is_running) = self.is_running {
            rule.is_running = is_running;
        }
        if let Some(at) = self.last_triggered {
            rule.last_triggered = Some(at);
        }
    }
}

/// Step-by-step builder for [`Rule`].
///
/// Building never fails; run [`Rule::validate`] to check invariants.
#[derive(Debug, Default)]
pub struct RuleBuilder {
    id: Option<RuleId>,
    name: Option<String>,
    description: Option<String>,
    enabled: Option<bool>,
    priority: i32,
    conditions: Vec<Condition>,
    actions: Vec<Action>,
    last_triggered: Option<Timestamp>,
}

impl RuleBuilder {
    #[must_use]
    pub fn id(mut self, id: RuleId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn last_triggered(mut self, ts: Timestamp) -> Self {
        self.last_triggered = Some(ts);
        self
    }

    #[must_use]
    pub fn build(self) -> Rule {
        Rule {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description,
            enabled: self.enabled.unwrap_or(true),
            priority: self.priority,
            conditions: self.conditions,
            actions: self.actions,
            last_triggered: self.last_triggered,
            is_running: false,
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// Wire form of a [`Rule`] whose conditions have not been checked yet.
///
/// A missing `id` is generated.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRecord {
    #[serde(default)]
    pub id: RuleId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub conditions: Vec<ConditionRecord>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub last_triggered: Option<Timestamp>,
    #[serde(default)]
    pub is_running: bool,
}

/// One of a rule's conditions is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("condition #{position}: {source}")]
pub struct RuleConditionError {
    /// Zero-based index of the offending condition.
    pub position: usize,
    #[source]
    pub source: InvalidConditionError,
}

impl TryFrom<RuleRecord> for Rule {
    type Error = RuleConditionError;

    fn try_from(record: RuleRecord) -> Result<Self, Self::Error> {
        let conditions = parse_conditions(&record.conditions)?;
        Ok(Self {
            id: record.id,
            name: record.name,
            description: record.description,
            enabled: record.enabled,
            priority: record.priority,
            conditions,
            actions: record.actions,
            last_triggered: record.last_triggered,
            is_running: record.is_running,
        })
    }
}

fn parse_conditions(records: &[ConditionRecord]) -> Result<Vec<Condition>, RuleConditionError> {
    records
        .iter()
        .enumerate()
        .map(|(position, c)| {
            Condition::try_from(c).map_err(|source| RuleConditionError { position, source })
        })
        .collect()
}

/// Partial update of a rule's editable fields (`PATCH`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "RulePatchRecord")]
pub struct RulePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub priority: Option<i32>,
    pub conditions: Option<Vec<Condition>>,
    pub actions: Option<Vec<Action>>,
}

/// Wire form of a [`RulePatch`] whose conditions have not been checked yet.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulePatchRecord {
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub priority: Option<i32>,
    pub conditions: Option<Vec<ConditionRecord>>,
    pub actions: Option<Vec<Action>>,
}

impl TryFrom<RulePatchRecord> for RulePatch {
    type Error = RuleConditionError;

    fn try_from(record: RulePatchRecord) -> Result<Self, Self::Error> {
        let conditions = record
            .conditions
            .as_deref()
            .map(parse_conditions)
            .transpose()?;
        Ok(Self {
            name: record.name,
            description: record.description,
            enabled: record.enabled,
            priority: record.priority,
            conditions,
            actions: record.actions,
        })
    }
}

impl RulePatch {
    /// Overwrite the fields present in the patch.
    pub fn apply_to(self, rule: &mut Rule) {
        if let Some(name) = self.name {
            rule.name = name;
        }
        if let Some(description) = self.description {
            rule.description = Some(description).filter(|d| !d.is_empty());
        }
        if let Some(enabled) = self.enabled {
            rule.enabled = enabled;
        }
        if let Some(priority) = self.priority {
            rule.priority = priority;
        }
        if let Some(conditions) = self.conditions {
            rule.conditions = conditions;
        }
        if let Some(actions) = self.actions {
            rule.actions = actions;
        }
    }
}
