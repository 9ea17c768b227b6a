//! Condition evaluator.
//!
//! Typed conditions evaluate infallibly through
//! [`Condition::is_satisfied`]. [`evaluate`] is the entry point for
//! conditions still in wire form: it rejects malformed definitions with
//! [`InvalidConditionError`] before evaluating.

use std::collections::BTreeMap;

use crate::error::InvalidConditionError;
use crate::snapshot::SystemSnapshot;

use super::condition::{Condition, ConditionRecord};

/// Resolves `custom` conditions, which the engine cannot evaluate alone.
///
/// Returning `None` means "unknown"; the condition is then unmet.
pub trait CustomPredicate {
    fn evaluate(&self, description: &str) -> Option<bool>;
}

/// Predicate that never answers, so every custom condition is unmet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCustomPredicate;

impl CustomPredicate for NoCustomPredicate {
    fn evaluate(&self, _description: &str) -> Option<bool> {
        None
    }
}

/// Predicate backed by a fixed table of description → outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticCustomPredicate(pub BTreeMap<String, bool>);

impl CustomPredicate for StaticCustomPredicate {
    fn evaluate(&self, description: &str) -> Option<bool> {
        self.0.get(description).copied()
    }
}

impl<F> CustomPredicate for F
where
    F: Fn(&str) -> Option<bool>,
{
    fn evaluate(&self, description: &str) -> Option<bool> {
        self(description)
    }
}

/// Evaluate a wire-form condition against a snapshot.
///
/// # Errors
///
/// Returns [`InvalidConditionError`] when the record has an unknown type or
/// operation, or a missing or ill-typed required field.
pub fn evaluate(
    record: &ConditionRecord,
    snapshot: &SystemSnapshot,
    custom: &dyn CustomPredicate,
) -> Result<bool, InvalidConditionError> {
    let condition = Condition::try_from(record)?;
    Ok(condition.is_satisfied(snapshot, custom))
}
