//! The host reports observed system state here; the engine loop picks up
//! the latest snapshot on its next scan.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use modhub_app::ports::{
    EventPublisher, EventStore, ModRepository, RuleRepository, SettingsRepository, SnapshotStore,
};
use modhub_domain::error::NotFoundError;
use modhub_domain::snapshot::SystemSnapshot;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/system/snapshot` — the latest reported snapshot.
pub async fn get_snapshot<RR, MR, SR, P, ES, SS>(
    State(state): State<AppState<RR, MR, SR, P, ES, SS>>,
) -> Result<Json<SystemSnapshot>, ApiError>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    let snapshot = state.snapshot_store.latest().await?.ok_or_else(|| {
        ApiError::from(modhub_domain::error::ModHubError::from(NotFoundError {
            entity: "Snapshot",
            id: "latest".to_string(),
        }))
    })?;
    Ok(Json(snapshot))
}

/// `PUT /api/system/snapshot` — replace the latest snapshot.
pub async fn put_snapshot<RR, MR, SR, P, ES, SS>(
    State(state): State<AppState<RR, MR, SR, P, ES, SS>>,
    Json(snapshot): Json<SystemSnapshot>,
) -> Result<StatusCode, ApiError>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    tracing::debug!(
        processes = snapshot.processes.len(),
        taken_at = %snapshot.now,
        "snapshot reported"
    );
    state.snapshot_store.replace(snapshot).await?;
    Ok(StatusCode::NO_CONTENT)
}
