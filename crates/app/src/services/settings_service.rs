//! Settings service — read and write key → value settings.

use modhub_domain::error::{ModHubError, NotFoundError};
use modhub_domain::setting::Setting;

use crate::ports::SettingsRepository;

pub struct SettingsService<R> {
    repo: R,
}

impl<R: SettingsRepository> SettingsService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Look up a setting by key.
    ///
    /// # Errors
    ///
    /// Returns [`ModHubError::NotFound`] when the key is unknown, or a
    /// storage error from the repository.
    pub async fn get_setting(&self, key: &str) -> Result<Setting, ModHubError> {
        self.repo.get(key).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Setting",
                id: key.to_string(),
            }
            .into()
        })
    }

    /// List all settings, ordered by key.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_settings(&self) -> Result<Vec<Setting>, ModHubError> {
        self.repo.get_all().await
    }

    /// Write a setting, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self, value))]
    pub async fn put_setting(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> Result<Setting, ModHubError> {
        self.repo.put(Setting::new(key, value)).await
    }
}
