//! Setting — a key → value pair that rules may adjust.

use serde::{Deserialize, Serialize};

use crate::time::{Timestamp, now};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setting {
    pub key: String,
    pub value: serde_json::Value,
    pub last_changed: Timestamp,
}

impl Setting {
    /// A setting stamped with the current time.
    #[must_use]
    pub fn new(key: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            value,
            last_changed: now(),
        }
    }
}
