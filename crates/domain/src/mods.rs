//! Mod — a named, toggleable behavior profile.

use serde::{Deserialize, Serialize};

use crate::error::{ModHubError, ValidationError};
use crate::id::ModId;
use crate::time::{Timestamp, now};

/// A behavior profile that rules switch on and off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mod {
    pub id: ModId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub active: bool,
    pub last_changed: Timestamp,
}

impl Mod {
    /// Create a builder for constructing a [`Mod`].
    #[must_use]
    pub fn builder() -> ModBuilder {
        ModBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ModHubError::Validation`] when `name` is blank.
    pub fn validate(&self) -> Result<(), ModHubError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    /// Switch the mod; returns whether anything changed.
    pub fn set_active(&mut self, active: bool, at: Timestamp) -> bool {
        if self.active == active {
            return false;
        }
        self.active = active;
        self.last_changed = at;
        true
    }

    /// Whether an action target designates this mod, by id or by
    /// case-insensitive name.
    #[must_use]
    pub fn matches_target(&self, target: &str) -> bool {
        let target = target.trim();
        self.id.to_string() == target || self.name.trim().eq_ignore_ascii_case(target)
    }
}

/// Step-by-step builder for [`Mod`].
#[derive(Debug, Default)]
pub struct ModBuilder {
    id: Option<ModId>,
    name: Option<String>,
    description: Option<String>,
    active: bool,
    last_changed: Option<Timestamp>,
}

impl ModBuilder {
    #[must_use]
    pub fn id(mut self, id: ModId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    #[must_use]
    pub fn last_changed(mut self, ts: Timestamp) -> Self {
        self.last_changed = Some(ts);
        self
    }

    /// Consume the builder, validate, and return a [`Mod`].
    ///
    /// # Errors
    ///
    /// Returns [`ModHubError::Validation`] if `name` is missing or blank.
    pub fn build(self) -> Result<Mod, ModHubError> {
        let m = Mod {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description,
            active: self.active,
            last_changed: self.last_changed.unwrap_or_else(now),
        };
        m.validate()?;
        Ok(m)
    }
}
