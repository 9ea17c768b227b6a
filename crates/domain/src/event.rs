//! Event — an immutable record of something that happened.
//!
//! Events are produced when rules fire or release, when actions run or are
//! suppressed, and when mods or settings change.

use serde::{Deserialize, Serialize};

use crate::id::{EventId, RuleId};
use crate::time::{Timestamp, now};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A rule became satisfied and its actions were dispatched.
    RuleTriggered,
    /// A running rule stopped matching.
    RuleReleased,
    /// One of a rule's actions failed.
    RuleFailed,
    /// An action lost its target to a higher-precedence rule.
    ActionSuppressed,
    ModActivated,
    ModDeactivated,
    SettingAdjusted,
    CommandRequested,
    NotificationRequested,
    CustomActionRequested,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::RuleTriggered => "rule_triggered",
            Self::RuleReleased => "rule_released",
            Self::RuleFailed => "rule_failed",
            Self::ActionSuppressed => "action_suppressed",
            Self::ModActivated => "mod_activated",
            Self::ModDeactivated => "mod_deactivated",
            Self::SettingAdjusted => "setting_adjusted",
            Self::CommandRequested => "command_requested",
            Self::NotificationRequested => "notification_requested",
            Self::CustomActionRequested => "custom_action_requested",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub event_type: EventType,
    /// Rule that caused the event, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<RuleId>,
    #[serde(default)]
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

impl Event {
    /// Create an event with a fresh id, stamped now.
    #[must_use]
    pub fn new(event_type: EventType, rule_id: Option<RuleId>, data: serde_json::Value) -> Self {
        Self {
            id: EventId::new(),
            event_type,
            rule_id,
            data,
            timestamp: now(),
        }
    }
}
