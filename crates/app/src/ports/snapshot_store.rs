//! Snapshot store port — the latest observed system state.

use std::future::Future;
use std::sync::Arc;

use modhub_domain::error::ModHubError;
use modhub_domain::snapshot::SystemSnapshot;

/// Holds the most recent [`SystemSnapshot`] reported by the host.
pub trait SnapshotStore {
    /// The latest snapshot, if one was ever reported.
    fn latest(&self) -> impl Future<Output = Result<Option<SystemSnapshot>, ModHubError>> + Send;

    /// Replace the latest snapshot.
    fn replace(&self, snapshot: SystemSnapshot)
    -> impl Future<Output = Result<(), ModHubError>> + Send;
}

impl<T: SnapshotStore + Send + Sync> SnapshotStore for Arc<T> {
    fn latest(&self) -> impl Future<Output = Result<Option<SystemSnapshot>, ModHubError>> + Send {
        (**self).latest()
    }

    fn replace(
        &self,
        snapshot: SystemSnapshot,
    ) -> impl Future<Output = Result<(), ModHubError>> + Send {
        (**self).replace(snapshot)
    }
}
