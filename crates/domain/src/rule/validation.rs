//! Construction-time validation and normalization of rules.
//!
//! Issues never block evaluation of saved rules; errors block saving.

use serde::{Deserialize, Serialize};

use super::{Action, Condition, Rule};

/// Shortest accepted inactivity threshold, in minutes.
pub const MIN_INACTIVITY_MINUTES: u32 = 1;
/// Longest accepted inactivity threshold (one day), in minutes.
pub const MAX_INACTIVITY_MINUTES: u32 = 1440;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    EmptyName,
    NoConditions,
    NoActions,
    InactivityOutOfRange,
    PriorityOutOfRange,
    PriorityClamped,
    CustomConditionUnresolved,
    EmptyActionTarget,
}

/// A single finding about a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    /// Path of the offending field, e.g. `conditions[1].thresholdMinutes`.
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn error(code: IssueCode, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(code: IssueCode, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            field: field.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Tunables for [`Rule::validate`] and [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub min_priority: i32,
    pub max_priority: i32,
    /// Clamp out-of-range priorities in [`normalize`] (always reported).
    pub clamp_priority: bool,
    /// Whether the host resolves `custom` conditions.
    pub custom_predicate_available: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            min_priority: 0,
            max_priority: 10,
            clamp_priority: false,
            custom_predicate_available: false,
        }
    }
}

impl ValidationPolicy {
    fn priority_in_range(&self, priority: i32) -> bool {
        (self.min_priority..=self.max_priority).contains(&priority)
    }
}

impl Rule {
    /// Check the rule's invariants.
    ///
    /// Errors: empty name, no conditions, inactivity threshold outside
    /// `[1, 1440]`. Warnings: no actions, priority outside the policy range,
    /// unresolvable custom conditions, empty action targets.
    #[must_use]
    pub fn validate(&self, policy: &ValidationPolicy) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if self.name.trim().is_empty() {
            issues.push(ValidationIssue::error(
                IssueCode::EmptyName,
                "name",
                "rule name must not be empty",
            ));
        }

        if self.conditions.is_empty() {
            issues.push(ValidationIssue::error(
                IssueCode::NoConditions,
                "conditions",
                "rule has no conditions and never triggers",
            ));
        }

        for (index, condition) in self.conditions.iter().enumerate() {
            match condition {
                Condition::Inactivity { threshold_minutes }
                    if !(MIN_INACTIVITY_MINUTES..=MAX_INACTIVITY_MINUTES)
                        .contains(threshold_minutes) =>
                {
                    issues.push(ValidationIssue::error(
                        IssueCode::InactivityOutOfRange,
                        format!("conditions[{index}].thresholdMinutes"),
                        format!(
                            "inactivity threshold {threshold_minutes} is outside \
                             [{MIN_INACTIVITY_MINUTES}, {MAX_INACTIVITY_MINUTES}] minutes"
                        ),
                    ));
                }
                Condition::Custom { description } if !policy.custom_predicate_available => {
                    issues.push(ValidationIssue::warning(
                        IssueCode::CustomConditionUnresolved,
                        format!("conditions[{index}]"),
                        format!("custom condition {description:?} has no predicate and always evaluates false"),
                    ));
                }
                _ => {}
            }
        }

        if self.actions.is_empty() {
            issues.push(ValidationIssue::warning(
                IssueCode::NoActions,
                "actions",
                "rule has no actions and has no effect",
            ));
        }

        for (index, action) in self.actions.iter().enumerate() {
            if action.target().trim().is_empty() {
                issues.push(ValidationIssue::warning(
                    IssueCode::EmptyActionTarget,
                    format!("actions[{index}].target"),
                    format!("{} action has no target", action.kind()),
                ));
            }
        }

        if !policy.priority_in_range(self.priority) {
            issues.push(ValidationIssue::warning(
                IssueCode::PriorityOutOfRange,
                "priority",
                format!(
                    "priority {} is outside [{}, {}]",
                    self.priority, policy.min_priority, policy.max_priority
                ),
            ));
        }

        issues
    }
}

/// Whether any issue blocks saving.
#[must_use]
pub fn has_errors(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(ValidationIssue::is_error)
}

/// Tidy a rule before saving and report what changed.
///
/// Trims the name, description, process names and action targets; drops an
/// empty description. With [`ValidationPolicy::clamp_priority`], an
/// out-of-range priority is clamped and a
/// [`IssueCode::PriorityClamped`] warning is returned.
#[must_use]
pub fn normalize(mut rule: Rule, policy: &ValidationPolicy) -> (Rule, Vec<ValidationIssue>) {
    let mut issues = Vec::new();

    rule.name = rule.name.trim().to_string();
    rule.description = rule
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    for condition in &mut rule.conditions {
        if let Condition::Process { process, .. } = condition {
            *process = process.trim().to_string();
        }
    }

    for action in &mut rule.actions {
        match action {
            Action::ActivateMod { target }
            | Action::DeactivateMod { target }
            | Action::AdjustSetting { target, .. }
            | Action::RunCommand { target, .. }
            | Action::Notify { target, .. }
            | Action::Custom { target, .. } => *target = target.trim().to_string(),
        }
    }

    if policy.clamp_priority && !policy.priority_in_range(rule.priority) {
        let clamped = rule
            .priority
            .clamp(policy.min_priority, policy.max_priority);
        issues.push(ValidationIssue::warning(
            IssueCode::PriorityClamped,
            "priority",
            format!("priority {} clamped to {clamped}", rule.priority),
        ));
        rule.priority = clamped;
    }

    (rule, issues)
}
