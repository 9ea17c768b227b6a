//! Mod service — use-cases for managing mods.

use modhub_domain::error::{ModHubError, NotFoundError};
use modhub_domain::event::{Event, EventType};
use modhub_domain::id::ModId;
use modhub_domain::mods::Mod;
use modhub_domain::time::now;

use crate::ports::{EventPublisher, ModRepository};

/// Application service for mod CRUD and manual toggling.
pub struct ModService<R, P> {
    repo: R,
    publisher: P,
}

impl<R: ModRepository, P: EventPublisher> ModService<R, P> {
    /// Create a new service backed by the given repository and publisher.
    pub fn new(repo: R, publisher: P) -> Self {
        Self { repo, publisher }
    }

    /// Register a new mod after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ModHubError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, m), fields(mod_name = %m.name))]
    pub async fn create_mod(&self, mut m: Mod) -> Result<Mod, ModHubError> {
        m.validate()?;
        m.last_changed = now();
        self.repo.create(m).await
    }

    /// Look up a mod by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`ModHubError::NotFound`] when no mod with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_mod(&self, id: ModId) -> Result<Mod, ModHubError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Mod",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all mods.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_mods(&self) -> Result<Vec<Mod>, ModHubError> {
        self.repo.get_all().await
    }

    /// Switch a mod on or off by hand.
    ///
    /// Publishes [`EventType::ModActivated`] or [`EventType::ModDeactivated`]
    /// only when the state actually changes.
    ///
    /// # Errors
    ///
    /// Returns [`ModHubError::NotFound`] if the mod does not exist,
    /// or a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn set_active(&self, id: ModId, active: bool) -> Result<Mod, ModHubError> {
        let mut m = self.get_mod(id).await?;
        if !m.set_active(active, now()) {
            return Ok(m);
        }
        let m = self.repo.update(m).await?;
        let event_type = if active {
            EventType::ModActivated
        } else {
            EventType::ModDeactivated
        };
        let event = Event::new(
            event_type,
            None,
            serde_json::json!({"modId": m.id, "name": m.name, "manual": true}),
        );
        let _ = self.publisher.publish(event).await;
        Ok(m)
    }

    /// Delete a mod by id.
    ///
    /// # Errors
    ///
    /// Returns [`ModHubError::NotFound`] if the mod does not exist, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_mod(&self, id: ModId) -> Result<(), ModHubError> {
        self.get_mod(id).await?;
        self.repo.delete(id).await
    }
}
