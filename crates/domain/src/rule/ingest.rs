//! Batch conversion of wire rules.
//!
//! A single malformed rule must not take down a whole batch: it is skipped
//! and reported, and the remaining rules are returned.

use serde::Serialize;

use super::{Rule, RuleConditionError, RuleRecord};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleIngestError {
    /// Not a rule object at all (wrong shape, bad action, bad id).
    #[error("malformed rule: {0}")]
    Malformed(String),
    #[error(transparent)]
    InvalidCondition(#[from] RuleConditionError),
}

/// A rule left out of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRule {
    /// Position in the input batch.
    pub index: usize,
    /// The rule's id, when it could be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "reason", serialize_with = "serialize_display")]
    pub error: RuleIngestError,
}

fn serialize_display<S: serde::Serializer>(
    error: &RuleIngestError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRules {
    pub rules: Vec<Rule>,
    pub skipped: Vec<SkippedRule>,
}

/// Convert raw JSON rules, skipping and reporting the ones that fail.
#[must_use]
pub fn parse_rules(values: Vec<serde_json::Value>) -> ParsedRules {
    let mut parsed = ParsedRules::default();

    for (index, value) in values.into_iter().enumerate() {
        let id = value
            .get("id")
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string);

        let result = serde_json::from_value::<RuleRecord>(value)
            .map_err(|err| RuleIngestError::Malformed(err.to_string()))
            .and_then(|record| Rule::try_from(record).map_err(RuleIngestError::from));

        match result {
            Ok(rule) => parsed.rules.push(rule),
            Err(error) => parsed.skipped.push(SkippedRule { index, id, error }),
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InvalidConditionError;

    #[test]
    fn should_skip_bad_rule_and_keep_the_rest() {
        let batch = vec![
            serde_json::json!({
                "name": "Gaming",
                "priority": 10,
                "conditions": [{"type": "process", "operation": "running", "value": "game.exe"}],
                "actions": [{"type": "activate_mod", "target": "Gaming Mod"}]
            }),
            serde_json::json!({
                "id": "00000000-0000-4000-8000-00000000000b",
                "name": "Broken",
                "conditions": [{"type": "weather", "value": "rain"}]
            }),
            serde_json::json!({
                "name": "Idle",
                "conditions": [{"type": "inactivity", "thresholdMinutes": 15}]
            }),
        ];

        let parsed = parse_rules(batch);

        let names: Vec<&str> = parsed.rules.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Gaming", "Idle"]);
        assert_eq!(parsed.skipped.len(), 1);
        let skipped = &parsed.skipped[0];
        assert_eq!(skipped.index, 1);
        assert_eq!(
            skipped.id.as_deref(),
            Some("00000000-0000-4000-8000-00000000000b")
        );
        assert!(matches!(
            &skipped.error,
            RuleIngestError::InvalidCondition(RuleConditionError {
                position: 0,
                source: InvalidConditionError::UnknownKind(kind),
            }) if kind == "weather"
        ));
    }

    #[test]
    fn should_report_non_object_as_malformed() {
        let parsed = parse_rules(vec![serde_json::json!("not a rule")]);
        assert!(parsed.rules.is_empty());
        assert!(matches!(
            parsed.skipped[0].error,
            RuleIngestError::Malformed(_)
        ));
        assert!(parsed.skipped[0].id.is_none());
    }

    #[test]
    fn should_serialize_skip_reason_as_message() {
        let parsed = parse_rules(vec![serde_json::json!({
            "name": "Broken",
            "conditions": [{"type": "inactivity"}]
        })]);
        let json = serde_json::to_value(&parsed.skipped[0]).unwrap();
        assert_eq!(json["index"], 0);
        assert!(json["reason"].as_str().unwrap().starts_with("condition #0"));
        assert!(json.get("id").is_none());
    }
}
