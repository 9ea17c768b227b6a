//! In-memory implementation of [`SettingsRepository`].

use std::collections::BTreeMap;
use std::sync::RwLock;

use modhub_app::ports::SettingsRepository;
use modhub_domain::error::ModHubError;
use modhub_domain::setting::Setting;

use crate::error::StorageError;

#[derive(Debug, Default)]
pub struct MemorySettingsRepository {
    settings: RwLock<BTreeMap<String, Setting>>,
}

impl MemorySettingsRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

const POISONED: StorageError = StorageError::Poisoned("settings");

impl SettingsRepository for MemorySettingsRepository {
    async fn get(&self, key: &str) -> Result<Option<Setting>, ModHubError> {
        let settings = self.settings.read().map_err(|_| POISONED)?;
        Ok(settings.get(key).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Setting>, ModHubError> {
        let settings = self.settings.read().map_err(|_| POISONED)?;
        Ok(settings.values().cloned().collect())
    }

    async fn put(&self, setting: Setting) -> Result<Setting, ModHubError> {
        let mut settings = self.settings.write().map_err(|_| POISONED)?;
        settings.insert(setting.key.clone(), setting.clone());
        Ok(setting)
    }
}
