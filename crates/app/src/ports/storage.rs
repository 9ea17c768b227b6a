//! Storage ports — repositories for mods and settings.

use std::future::Future;
use std::sync::Arc;

use modhub_domain::error::ModHubError;
use modhub_domain::id::ModId;
use modhub_domain::mods::Mod;
use modhub_domain::setting::Setting;

/// Repository for persisting and querying [`Mod`]s.
pub trait ModRepository {
    fn create(&self, m: Mod) -> impl Future<Output = Result<Mod, ModHubError>> + Send;

    fn get_by_id(&self, id: ModId)
    -> impl Future<Output = Result<Option<Mod>, ModHubError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Mod>, ModHubError>> + Send;

    /// Resolve an action target: a mod id, or a mod name compared
    /// case-insensitively.
    fn find_by_target(
        &self,
        target: &str,
    ) -> impl Future<Output = Result<Option<Mod>, ModHubError>> + Send;

    /// Replace an existing mod.
    ///
    /// Returns [`ModHubError::NotFound`] when no mod has the same id.
    fn update(&self, m: Mod) -> impl Future<Output = Result<Mod, ModHubError>> + Send;

    fn delete(&self, id: ModId) -> impl Future<Output = Result<(), ModHubError>> + Send;
}

impl<T: ModRepository + Send + Sync> ModRepository for Arc<T> {
    fn create(&self, m: Mod) -> impl Future<Output = Result<Mod, ModHubError>> + Send {
        (**self).create(m)
    }

    fn get_by_id(
        &self,
        id: ModId,
    ) -> impl Future<Output = Result<Option<Mod>, ModHubError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Mod>, ModHubError>> + Send {
        (**self).get_all()
    }

    fn find_by_target(
        &self,
        target: &str,
    ) -> impl Future<Output = Result<Option<Mod>, ModHubError>> + Send {
        (**self).find_by_target(target)
    }

    fn update(&self, m: Mod) -> impl Future<Output = Result<Mod, ModHubError>> + Send {
        (**self).update(m)
    }

    fn delete(&self, id: ModId) -> impl Future<Output = Result<(), ModHubError>> + Send {
        (**self).delete(id)
    }
}

/// Key → value store for [`Setting`]s.
pub trait SettingsRepository {
    fn get(&self, key: &str)
    -> impl Future<Output = Result<Option<Setting>, ModHubError>> + Send;

    /// All settings, ordered by key.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Setting>, ModHubError>> + Send;

    /// Insert or overwrite a setting.
    fn put(&self, setting: Setting) -> impl Future<Output = Result<Setting, ModHubError>> + Send;
}

impl<T: SettingsRepository + Send + Sync> SettingsRepository for Arc<T> {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<Setting>, ModHubError>> + Send {
        (**self).get(key)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Setting>, ModHubError>> + Send {
        (**self).get_all()
    }

    fn put(&self, setting: Setting) -> impl Future<Output = Result<Setting, ModHubError>> + Send {
        (**self).put(setting)
    }
}
