//! Action — the effect requested when a rule fires.

use serde::{Deserialize, Serialize};

/// An operation to perform once all of a rule's conditions hold.
///
/// Targets are plain identifiers; they are resolved against the mod
/// registry or settings store by the dispatcher, not by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Switch a mod on. `target` is the mod id or name.
    ActivateMod { target: String },
    /// Switch a mod off. `target` is the mod id or name.
    DeactivateMod { target: String },
    /// Write a setting. `target` is the setting key.
    AdjustSetting {
        target: String,
        value: serde_json::Value,
    },
    /// Ask the host to run a command.
    RunCommand {
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<serde_json::Value>,
    },
    /// Ask the host to show a notification.
    Notify {
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<serde_json::Value>,
    },
    /// Host-defined extension.
    Custom {
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<serde_json::Value>,
    },
}

/// Identifies a resource that at most one rule may drive per dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConflictKey {
    /// A mod, keyed by its lowercased target.
    Mod(String),
    /// A setting, keyed by its key.
    Setting(String),
}

impl Action {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ActivateMod { .. } => "activate_mod",
            Self::DeactivateMod { .. } => "deactivate_mod",
            Self::AdjustSetting { .. } => "adjust_setting",
            Self::RunCommand { .. } => "run_command",
            Self::Notify { .. } => "notify",
            Self::Custom { .. } => "custom",
        }
    }

    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::ActivateMod { target }
            | Self::DeactivateMod { target }
            | Self::AdjustSetting { target, .. }
            | Self::RunCommand { target, .. }
            | Self::Notify { target, .. }
            | Self::Custom { target, .. } => target,
        }
    }

    /// The mutually exclusive resource this action drives, if any.
    ///
    /// Activating and deactivating the same mod compete for one key.
    /// Commands, notifications and custom actions never conflict.
    #[must_use]
    pub fn conflict_key(&self) -> Option<ConflictKey> {
        match self {
            Self::ActivateMod { target } | Self::DeactivateMod { target } => {
                Some(ConflictKey::Mod(target.trim().to_lowercase()))
            }
            Self::AdjustSetting { target, .. } => Some(ConflictKey::Setting(target.trim().to_string())),
            Self::RunCommand { .. } | Self::Notify { .. } | Self::Custom { .. } => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.kind(), self.target())
    }
}
