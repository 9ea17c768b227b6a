//! Condition — a predicate over a system snapshot.
//!
//! On the wire a condition is a flat, loosely-typed [`ConditionRecord`];
//! inside the domain it is the [`Condition`] sum type whose variants carry
//! exactly the fields they need. Converting a record into a condition is
//! where malformed definitions are rejected with [`InvalidConditionError`].

use serde::{Deserialize, Serialize};

use crate::error::InvalidConditionError;
use crate::snapshot::{StateValue, SystemSnapshot};
use crate::time::TimeOfDay;

use super::evaluator::CustomPredicate;

/// Whether a `process` condition wants the process present or absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessOperation {
    Running,
    #[serde(alias = "not-running")]
    NotRunning,
}

impl ProcessOperation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::NotRunning => "not_running",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text {
            "running" => Some(Self::Running),
            "not_running" | "not-running" => Some(Self::NotRunning),
            _ => None,
        }
    }
}

/// A window over the time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeWindow {
    /// From this time (inclusive) until midnight.
    After(TimeOfDay),
    /// From midnight until this time (exclusive).
    Before(TimeOfDay),
    /// From `start` (inclusive) to `end` (exclusive), wrapping past
    /// midnight when `start > end`.
    Between { start: TimeOfDay, end: TimeOfDay },
}

impl TimeWindow {
    /// Whether `time` falls inside the window.
    #[must_use]
    pub fn contains(self, time: TimeOfDay) -> bool {
        match self {
            Self::After(at) => time >= at,
            Self::Before(at) => time < at,
            Self::Between { start, end } if start > end => time >= start || time < end,
            Self::Between { start, end } => start <= time && time < end,
        }
    }

    fn operation(self) -> &'static str {
        match self {
            Self::After(_) => "after",
            Self::Before(_) => "before",
            Self::Between { .. } => "between",
        }
    }
}

/// A predicate that must hold for a rule to fire.
///
/// All conditions of a rule must be satisfied (logical AND).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConditionRecord", into = "ConditionRecord")]
pub enum Condition {
    /// A named process is (or is not) running.
    Process {
        operation: ProcessOperation,
        /// Process name, compared case-insensitively.
        process: String,
    },
    /// The current time of day is inside a window.
    Time(TimeWindow),
    /// The user has been idle for at least this many minutes.
    Inactivity { threshold_minutes: u32 },
    /// A system-state key holds exactly this value.
    SystemState { key: String, expected: StateValue },
    /// Delegated to a host-supplied predicate.
    Custom { description: String },
}

impl Condition {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Process { .. } => "process",
            Self::Time(_) => "time",
            Self::Inactivity { .. } => "inactivity",
            Self::SystemState { .. } => "system_state",
            Self::Custom { .. } => "custom",
        }
    }

    /// Evaluate the condition against a snapshot.
    ///
    /// `custom` resolves [`Condition::Custom`]; when it declines to answer
    /// the condition is unmet.
    #[must_use]
    pub fn is_satisfied(&self, snapshot: &SystemSnapshot, custom: &dyn CustomPredicate) -> bool {
        match self {
            Self::Process { operation, process } => {
                let running = snapshot.is_process_running(process);
                match operation {
                    ProcessOperation::Running => running,
                    ProcessOperation::NotRunning => !running,
                }
            }
            Self::Time(window) => window.contains(snapshot.time_of_day()),
            Self::Inactivity { threshold_minutes } => {
                snapshot.idle_minutes >= f64::from(*threshold_minutes)
            }
            Self::SystemState { key, expected } => snapshot.state_value(key) == Some(expected),
            Self::Custom { description } => custom.evaluate(description).unwrap_or(false),
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Process { operation, process } => {
                write!(f, "process({} {process})", operation.as_str())
            }
            Self::Time(TimeWindow::Between { start, end }) => {
                write!(f, "time(between {start}..{end})")
            }
            Self::Time(window @ (TimeWindow::After(at) | TimeWindow::Before(at))) => {
                write!(f, "time({} {at})", window.operation())
            }
            Self::Inactivity { threshold_minutes } => {
                write!(f, "inactivity(>= {threshold_minutes}m)")
            }
            Self::SystemState { key, expected } => write!(f, "system_state({key} == {expected})"),
            Self::Custom { description } => write!(f, "custom({description})"),
        }
    }
}

/// Flat wire shape of a condition, as exchanged with editors and the API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionRecord {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_minutes: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TryFrom<&ConditionRecord> for Condition {
    type Error = InvalidConditionError;

    fn try_from(record: &ConditionRecord) -> Result<Self, Self::Error> {
        let kind = record
            .kind
            .as_deref()
            .ok_or(InvalidConditionError::MissingField {
                kind: "condition",
                field: "type",
            })?;
        match kind {
            "process" => parse_process(record),
            "time" => parse_time(record),
            "inactivity" => parse_inactivity(record),
            "system_state" | "system-state" => parse_system_state(record),
            "custom" => parse_custom(record),
            other => Err(InvalidConditionError::UnknownKind(other.to_string())),
        }
    }
}

impl TryFrom<ConditionRecord> for Condition {
    type Error = InvalidConditionError;

    fn try_from(record: ConditionRecord) -> Result<Self, Self::Error> {
        Self::try_from(&record)
    }
}

impl From<Condition> for ConditionRecord {
    fn from(condition: Condition) -> Self {
        let kind = Some(condition.kind().to_string());
        match condition {
            Condition::Process { operation, process } => Self {
                kind,
                operation: Some(operation.as_str().to_string()),
                value: Some(serde_json::Value::String(process)),
                ..Self::default()
            },
            Condition::Time(window) => {
                let value = match window {
                    TimeWindow::After(at) | TimeWindow::Before(at) => {
                        serde_json::Value::String(at.to_string())
                    }
                    TimeWindow::Between { start, end } => {
                        serde_json::json!([start.to_string(), end.to_string()])
                    }
                };
                Self {
                    kind,
                    operation: Some(window.operation().to_string()),
                    value: Some(value),
                    ..Self::default()
                }
            }
            Condition::Inactivity { threshold_minutes } => Self {
                kind,
                threshold_minutes: Some(serde_json::Value::from(threshold_minutes)),
                ..Self::default()
            },
            Condition::SystemState { key, expected } => Self {
                kind,
                key: Some(key),
                value: Some(expected.to_json()),
                ..Self::default()
            },
            Condition::Custom { description } => Self {
                kind,
                description: Some(description),
                ..Self::default()
            },
        }
    }
}

fn required_operation<'a>(
    record: &'a ConditionRecord,
    kind: &'static str,
) -> Result<&'a str, InvalidConditionError> {
    record
        .operation
        .as_deref()
        .ok_or(InvalidConditionError::MissingField {
            kind,
            field: "operation",
        })
}

fn required_value<'a>(
    record: &'a ConditionRecord,
    kind: &'static str,
) -> Result<&'a serde_json::Value, InvalidConditionError> {
    record
        .value
        .as_ref()
        .ok_or(InvalidConditionError::MissingField {
            kind,
            field: "value",
        })
}

fn invalid(kind: &'static str, field: &'static str, reason: impl Into<String>) -> InvalidConditionError {
    InvalidConditionError::InvalidField {
        kind,
        field,
        reason: reason.into(),
    }
}

fn parse_process(record: &ConditionRecord) -> Result<Condition, InvalidConditionError> {
    const KIND: &str = "process";
    let operation = required_operation(record, KIND)?;
    let operation =
        ProcessOperation::parse(operation).ok_or_else(|| InvalidConditionError::UnknownOperation {
            kind: KIND,
            operation: operation.to_string(),
        })?;
    let process = required_value(record, KIND)?
        .as_str()
        .ok_or_else(|| invalid(KIND, "value", "expected a process name"))?
        .trim();
    if process.is_empty() {
        return Err(invalid(KIND, "value", "process name is empty"));
    }
    Ok(Condition::Process {
        operation,
        process: process.to_string(),
    })
}

fn parse_time_of_day(value: &serde_json::Value) -> Result<TimeOfDay, InvalidConditionError> {
    value
        .as_str()
        .ok_or_else(|| invalid("time", "value", "expected an HH:MM string"))?
        .parse()
        .map_err(|err: crate::time::InvalidTimeOfDay| invalid("time", "value", err.to_string()))
}

fn parse_time_range(value: &serde_json::Value) -> Result<TimeWindow, InvalidConditionError> {
    let (start, end) = match value {
        serde_json::Value::Array(items) if items.len() == 2 => {
            (parse_time_of_day(&items[0])?, parse_time_of_day(&items[1])?)
        }
        serde_json::Value::String(text) => {
            let (start, end) = text
                .split_once('-')
                .ok_or_else(|| invalid("time", "value", "expected HH:MM-HH:MM"))?;
            let parse = |s: &str| {
                s.parse::<TimeOfDay>()
                    .map_err(|err| invalid("time", "value", err.to_string()))
            };
            (parse(start)?, parse(end)?)
        }
        _ => {
            return Err(invalid(
                "time",
                "value",
                "expected a [start, end] pair for between",
            ));
        }
    };
    Ok(TimeWindow::Between { start, end })
}

fn parse_time(record: &ConditionRecord) -> Result<Condition, InvalidConditionError> {
    const KIND: &str = "time";
    let operation = required_operation(record, KIND)?;
    let value = required_value(record, KIND)?;
    let window = match operation {
        "after" => TimeWindow::After(parse_time_of_day(value)?),
        "before" => TimeWindow::Before(parse_time_of_day(value)?),
        "between" => parse_time_range(value)?,
        other => {
            return Err(InvalidConditionError::UnknownOperation {
                kind: KIND,
                operation: other.to_string(),
            });
        }
    };
    Ok(Condition::Time(window))
}

fn parse_inactivity(record: &ConditionRecord) -> Result<Condition, InvalidConditionError> {
    const KIND: &str = "inactivity";
    let threshold = record
        .threshold_minutes
        .as_ref()
        .ok_or(InvalidConditionError::MissingField {
            kind: KIND,
            field: "thresholdMinutes",
        })?;
    let threshold_minutes = threshold
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| invalid(KIND, "thresholdMinutes", "expected a whole number of minutes"))?;
    Ok(Condition::Inactivity { threshold_minutes })
}

fn parse_system_state(record: &ConditionRecord) -> Result<Condition, InvalidConditionError> {
    const KIND: &str = "system_state";
    let key = record
        .key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(InvalidConditionError::MissingField { kind: KIND, field: "key" })?;
    let expected = StateValue::from_json(required_value(record, KIND)?)
        .ok_or_else(|| invalid(KIND, "value", "expected a string, number or boolean"))?;
    Ok(Condition::SystemState {
        key: key.to_string(),
        expected,
    })
}

fn parse_custom(record: &ConditionRecord) -> Result<Condition, InvalidConditionError> {
    let description = record
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or(InvalidConditionError::MissingField {
            kind: "custom",
            field: "description",
        })?;
    Ok(Condition::Custom {
        description: description.to_string(),
    })
}
