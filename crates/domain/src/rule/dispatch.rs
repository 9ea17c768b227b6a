//! Conflict resolution between satisfied rules.
//!
//! Rules arrive in precedence order. The first rule to claim a
//! [`ConflictKey`] owns it for the dispatch; later actions on the same key
//! are suppressed and record the winner.

use std::collections::HashMap;

use serde::Serialize;

use crate::id::RuleId;

use super::{Action, ConflictKey, Rule};

/// An action cleared for execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedAction {
    pub rule_id: RuleId,
    pub action: Action,
}

/// An action dropped because a higher-precedence rule owns its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuppressedAction {
    pub rule_id: RuleId,
    pub action: Action,
    pub winner: RuleId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchPlan {
    pub planned: Vec<PlannedAction>,
    pub suppressed: Vec<SuppressedAction>,
}

impl DispatchPlan {
    /// Planned actions belonging to one rule, in declaration order.
    pub fn planned_for(&self, rule_id: RuleId) -> impl Iterator<Item = &Action> + '_ {
        self.planned
            .iter()
            .filter(move |p| p.rule_id == rule_id)
            .map(|p| &p.action)
    }

    /// Suppressed actions belonging to one rule.
    pub fn suppressed_for(&self, rule_id: RuleId) -> impl Iterator<Item = &SuppressedAction> + '_ {
        self.suppressed.iter().filter(move |s| s.rule_id == rule_id)
    }

    /// Keys a rule owns in this plan.
    pub fn owned_by(&self, rule_id: RuleId) -> impl Iterator<Item = ConflictKey> + '_ {
        self.planned_for(rule_id).filter_map(Action::conflict_key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.planned.is_empty() && self.suppressed.is_empty()
    }
}

/// Build the dispatch plan for rules already sorted by precedence.
///
/// A rule may drive the same key several times itself (e.g. deactivate then
/// activate); only other rules are locked out.
#[must_use]
pub fn plan_dispatch(ordered: &[&Rule]) -> DispatchPlan {
    let mut owners: HashMap<ConflictKey, RuleId> = HashMap::new();
    let mut plan = DispatchPlan::default();

    for rule in ordered {
        for action in &rule.actions {
            let Some(key) = action.conflict_key() else {
                plan.planned.push(PlannedAction {
                    rule_id: rule.id,
                    action: action.clone(),
                });
                continue;
            };
            let owner = *owners.entry(key).or_insert(rule.id);
            if owner == rule.id {
                plan.planned.push(PlannedAction {
                    rule_id: rule.id,
                    action: action.clone(),
                });
            } else {
                plan.suppressed.push(SuppressedAction {
                    rule_id: rule.id,
                    action: action.clone(),
                    winner: owner,
                });
            }
        }
    }

    plan
}
