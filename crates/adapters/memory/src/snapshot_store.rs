//! In-memory implementation of [`SnapshotStore`].

use std::sync::RwLock;

use modhub_app::ports::SnapshotStore;
use modhub_domain::error::ModHubError;
use modhub_domain::snapshot::SystemSnapshot;

use crate::error::StorageError;

/// Holds only the most recent snapshot.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    latest: RwLock<Option<SystemSnapshot>>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

const POISONED: StorageError = StorageError::Poisoned("snapshot");

impl SnapshotStore for MemorySnapshotStore {
    async fn latest(&self) -> Result<Option<SystemSnapshot>, ModHubError> {
        let latest = self.latest.read().map_err(|_| POISONED)?;
        Ok(latest.clone())
    }

    async fn replace(&self, snapshot: SystemSnapshot) -> Result<(), ModHubError> {
        let mut latest = self.latest.write().map_err(|_| POISONED)?;
        *latest = Some(snapshot);
        Ok(())
    }
}
