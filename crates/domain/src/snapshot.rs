//! System snapshot — the point-in-time observed state fed into evaluation.
//!
//! Snapshots are produced outside the domain (OS polling, hooks) and are
//! immutable for the duration of an evaluation pass. Missing fields
//! deserialize to empty values so that conditions reading them fail closed.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::{TimeOfDay, WallClock};

/// A primitive value stored under a system-state key.
///
/// Comparison is strict: `true`, `1` and `"true"` are three different values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl StateValue {
    /// Convert a JSON value, rejecting `null`, arrays and objects.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(Self::Number),
            serde_json::Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for StateValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for StateValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Observed system state at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSnapshot {
    /// Names of the currently running processes.
    #[serde(default)]
    pub processes: Vec<String>,
    /// Wall-clock time of the observation.
    pub now: WallClock,
    /// How long the user has been idle, in minutes.
    #[serde(default)]
    pub idle_minutes: f64,
    /// Arbitrary system-state flags (power source, display mode, …).
    #[serde(default)]
    pub state: BTreeMap<String, StateValue>,
}

impl SystemSnapshot {
    /// Empty snapshot taken at `now`: no processes, not idle, no state.
    #[must_use]
    pub fn at(now: WallClock) -> Self {
        Self {
            processes: Vec::new(),
            now,
            idle_minutes: 0.0,
            state: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn process(mut self, name: impl Into<String>) -> Self {
        self.processes.push(name.into());
        self
    }

    #[must_use]
    pub fn idle_minutes(mut self, minutes: f64) -> Self {
        self.idle_minutes = minutes;
        self
    }

    #[must_use]
    pub fn state(mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.state.insert(key.into(), value.into());
        self
    }

    /// Whether a process with this name is running (case-insensitive).
    #[must_use]
    pub fn is_process_running(&self, name: &str) -> bool {
        let wanted = name.to_lowercase();
        self.processes.iter().any(|p| p.to_lowercase() == wanted)
    }

    /// Time of day of the observation, on the observed clock face.
    #[must_use]
    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay::of(&self.now)
    }

    #[must_use]
    pub fn state_value(&self, key: &str) -> Option<&StateValue> {
        self.state.get(key)
    }
}
