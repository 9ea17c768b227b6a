//! JSON REST handlers for settings.

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;

use modhub_app::ports::{
    EventPublisher, EventStore, ModRepository, RuleRepository, SettingsRepository, SnapshotStore,
};
use modhub_domain::setting::Setting;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for writing a setting.
#[derive(Deserialize)]
pub struct PutSettingRequest {
    pub value: serde_json::Value,
}

/// `GET /api/settings` — list all settings, ordered by key.
pub async fn list<RR, MR, SR, P, ES, SS>(
    State(state): State<AppState<RR, MR, SR, P, ES, SS>>,
) -> Result<Json<Vec<Setting>>, ApiError>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    Ok(Json(state.settings_service.list_settings().await?))
}

/// `GET /api/settings/{key}`
pub async fn get<RR, MR, SR, P, ES, SS>(
    State(state): State<AppState<RR, MR, SR, P, ES, SS>>,
    Path(key): Path<String>,
) -> Result<Json<Setting>, ApiError>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    Ok(Json(state.settings_service.get_setting(&key).await?))
}

/// `PUT /api/settings/{key}` — write a setting, creating it if needed.
pub async fn put<RR, MR, SR, P, ES, SS>(
    State(state): State<AppState<RR, MR, SR, P, ES, SS>>,
    Path(key): Path<String>,
    Json(req): Json<PutSettingRequest>,
) -> Result<Json<Setting>, ApiError>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    let setting = state.settings_service.put_setting(&key, req.value).await?;
    Ok(Json(setting))
}
