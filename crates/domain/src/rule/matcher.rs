//! Rule matcher — which rules hold for a snapshot, and in which order.

use std::cmp::Ordering;

use serde::Serialize;

use crate::id::RuleId;
use crate::snapshot::SystemSnapshot;

use super::Rule;
use super::evaluator::CustomPredicate;

impl Rule {
    /// Whether every condition holds.
    ///
    /// A rule without conditions is never satisfied. The `enabled` flag is
    /// not considered here.
    #[must_use]
    pub fn is_satisfied(&self, snapshot: &SystemSnapshot, custom: &dyn CustomPredicate) -> bool {
        !self.conditions.is_empty()
            && self
                .conditions
                .iter()
                .all(|c| c.is_satisfied(snapshot, custom))
    }
}

/// Precedence between two rules: higher priority first, then lower id.
#[must_use]
pub fn precedence(a: &Rule, b: &Rule) -> Ordering {
    b.priority.cmp(&a.priority).then_with(|| a.id.cmp(&b.id))
}

/// Enabled rules whose conditions all hold, in precedence order.
///
/// The first rule in the returned order takes precedence for any
/// mutually exclusive target. Inputs are not modified.
#[must_use]
pub fn find_triggered_rules<'a>(
    rules: &'a [Rule],
    snapshot: &SystemSnapshot,
    custom: &dyn CustomPredicate,
) -> Vec<&'a Rule> {
    let mut triggered: Vec<&Rule> = rules
        .iter()
        .filter(|rule| rule.enabled && rule.is_satisfied(snapshot, custom))
        .collect();
    triggered.sort_by(|a, b| precedence(a, b));
    triggered
}

/// Outcome of one condition, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionResult {
    pub condition: String,
    pub satisfied: bool,
}

/// Per-condition breakdown of a rule against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEvaluation {
    pub id: RuleId,
    pub name: String,
    pub enabled: bool,
    pub priority: i32,
    pub conditions: Vec<ConditionResult>,
    /// All conditions hold and there is at least one.
    pub satisfied: bool,
    /// Satisfied and enabled.
    pub triggered: bool,
}

/// Evaluate every rule condition by condition, in precedence order.
#[must_use]
pub fn explain(
    rules: &[Rule],
    snapshot: &SystemSnapshot,
    custom: &dyn CustomPredicate,
) -> Vec<RuleEvaluation> {
    let mut ordered: Vec<&Rule> = rules.iter().collect();
    ordered.sort_by(|a, b| precedence(a, b));
    ordered
        .into_iter()
        .map(|rule| {
            let conditions: Vec<ConditionResult> = rule
                .conditions
                .iter()
                .map(|c| ConditionResult {
                    condition: c.to_string(),
                    satisfied: c.is_satisfied(snapshot, custom),
                })
                .collect();
            let satisfied = !conditions.is_empty() && conditions.iter().all(|c| c.satisfied);
            RuleEvaluation {
                id: rule.id,
                name: rule.name.clone(),
                enabled: rule.enabled,
                priority: rule.priority,
                conditions,
                satisfied,
                triggered: satisfied && rule.enabled,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::rule::evaluator::NoCustomPredicate;
    use crate::rule::{Action, Condition, ProcessOperation, TimeWindow};

    fn snapshot(time: &str) -> SystemSnapshot {
        let clock =
            chrono::DateTime::parse_from_rfc3339(&format!("2026-10-17T{time}:00+00:00")).unwrap();
        SystemSnapshot::at(clock)
    }

    fn running(process: &str) -> Condition {
        Condition::Process {
            operation: ProcessOperation::Running,
            process: process.to_string(),
        }
    }

    fn after(time: &str) -> Condition {
        Condition::Time(TimeWindow::After(time.parse().unwrap()))
    }

    fn activate(target: &str) -> Action {
        Action::ActivateMod {
            target: target.to_string(),
        }
    }

    fn rule_with_id(id: &str, priority: i32) -> Rule {
        Rule::builder()
            .id(RuleId::from_str(id).unwrap())
            .name(id)
            .priority(priority)
            .condition(running("game.exe"))
            .action(activate("Gaming Mod"))
            .build()
    }

    #[test]
    fn should_order_scenario_rules_by_priority() {
        let gaming = Rule::builder()
            .name("Gaming")
            .priority(10)
            .condition(running("game.exe"))
            .action(activate("Gaming Mod"))
            .build();
        let night = Rule::builder()
            .name("Night")
            .priority(5)
            .condition(after("22:00"))
            .action(activate("Night Mod"))
            .build();
        let rules = vec![night.clone(), gaming.clone()];
        let snap = snapshot("23:00").process("game.exe");

        let triggered = find_triggered_rules(&rules, &snap, &NoCustomPredicate);

        let ids: Vec<RuleId> = triggered.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![gaming.id, night.id]);
    }

    #[test]
    fn should_never_trigger_rule_without_conditions() {
        let empty = Rule::builder()
            .name("Empty")
            .priority(10)
            .action(activate("Gaming Mod"))
            .build();
        let rules = vec![empty];
        for snap in [
            snapshot("00:00"),
            snapshot("12:00").process("game.exe").idle_minutes(999.0),
        ] {
            assert!(find_triggered_rules(&rules, &snap, &NoCustomPredicate).is_empty());
        }
    }

    #[test]
    fn should_skip_disabled_rules() {
        let mut rule = rule_with_id("00000000-0000-4000-8000-000000000001", 1);
        rule.enabled = false;
        let rules = vec![rule];
        let snap = snapshot("12:00").process("game.exe");
        assert!(find_triggered_rules(&rules, &snap, &NoCustomPredicate).is_empty());
    }

    #[test]
    fn should_require_all_conditions() {
        let rule = Rule::builder()
            .name("Both")
            .condition(running("game.exe"))
            .condition(after("22:00"))
            .action(activate("Gaming Mod"))
            .build();
        let rules = vec![rule];
        let only_process = snapshot("12:00").process("game.exe");
        let both = snapshot("22:30").process("game.exe");
        assert!(find_triggered_rules(&rules, &only_process, &NoCustomPredicate).is_empty());
        assert_eq!(find_triggered_rules(&rules, &both, &NoCustomPredicate).len(), 1);
    }

    #[test]
    fn should_break_priority_ties_by_ascending_id() {
        let rules = vec![
            rule_with_id("c0000000-0000-4000-8000-000000000000", 5),
            rule_with_id("a0000000-0000-4000-8000-000000000000", 5),
            rule_with_id("b0000000-0000-4000-8000-000000000000", 7),
        ];
        let snap = snapshot("12:00").process("game.exe");
        let names: Vec<&str> = find_triggered_rules(&rules, &snap, &NoCustomPredicate)
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "b0000000-0000-4000-8000-000000000000",
                "a0000000-0000-4000-8000-000000000000",
                "c0000000-0000-4000-8000-000000000000",
            ]
        );
    }

    #[test]
    fn should_return_identical_output_on_repeated_calls() {
        let rules: Vec<Rule> = (0..8)
            .map(|i| {
                Rule::builder()
                    .name(format!("rule {i}"))
                    .priority(i % 3)
                    .condition(running("game.exe"))
                    .action(activate("Gaming Mod"))
                    .build()
            })
            .collect();
        let before = rules.clone();
        let snap = snapshot("12:00").process("game.exe");

        let first: Vec<RuleId> = find_triggered_rules(&rules, &snap, &NoCustomPredicate)
            .iter()
            .map(|r| r.id)
            .collect();
        let second: Vec<RuleId> = find_triggered_rules(&rules, &snap, &NoCustomPredicate)
            .iter()
            .map(|r| r.id)
            .collect();

        assert_eq!(first, second);
        assert_eq!(rules, before);
    }

    #[test]
    fn should_explain_each_condition() {
        let rule = Rule::builder()
            .name("Gaming at night")
            .condition(running("game.exe"))
            .condition(after("22:00"))
            .action(activate("Gaming Mod"))
            .build();
        let snap = snapshot("12:00").process("game.exe");

        let report = explain(std::slice::from_ref(&rule), &snap, &NoCustomPredicate);

        assert_eq!(report.len(), 1);
        let eval = &report[0];
        assert_eq!(eval.id, rule.id);
        assert!(!eval.satisfied);
        assert!(!eval.triggered);
        assert_eq!(
            eval.conditions
                .iter()
                .map(|c| c.satisfied)
                .collect::<Vec<_>>(),
            vec![true, false]
        );
        assert_eq!(eval.conditions[0].condition, "process(running game.exe)");
    }

    #[test]
    fn should_mark_disabled_but_satisfied_rule_as_not_triggered() {
        let mut rule = rule_with_id("00000000-0000-4000-8000-000000000002", 0);
        rule.enabled = false;
        let snap = snapshot("12:00").process("game.exe");
        let report = explain(&[rule], &snap, &NoCustomPredicate);
        assert!(report[0].satisfied);
        assert!(!report[0].triggered);
    }
}
