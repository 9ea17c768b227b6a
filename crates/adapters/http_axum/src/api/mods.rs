//! JSON REST handlers for mods.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use modhub_app::ports::{
    EventPublisher, EventStore, ModRepository, RuleRepository, SettingsRepository, SnapshotStore,
};
use modhub_domain::id::ModId;
use modhub_domain::mods::Mod;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for registering a mod.
#[derive(Deserialize)]
pub struct CreateModRequest {
    pub name: String,
    pub description: Option<String>,
    pub active: Option<bool>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Mod>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get, activate and deactivate endpoints.
pub enum GetResponse {
    Ok(Json<Mod>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create endpoint.
pub enum CreateResponse {
    Created(Json<Mod>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

fn parse_id(id: &str) -> Result<ModId, ApiError> {
    ModId::from_str(id).map_err(|_| ApiError::invalid_id("mod", id))
}

/// `GET /api/mods` — list all mods.
pub async fn list<RR, MR, SR, P, ES, SS>(
    State(state): State<AppState<RR, MR, SR, P, ES, SS>>,
) -> Result<ListResponse, ApiError>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    let mods = state.mod_service.list_mods().await?;
    Ok(ListResponse::Ok(Json(mods)))
}

/// `GET /api/mods/{id}` — get mod by ID.
pub async fn get<RR, MR, SR, P, ES, SS>(
    State(state): State<AppState<RR, MR, SR, P, ES, SS>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    let m = state.mod_service.get_mod(parse_id(&id)?).await?;
    Ok(GetResponse::Ok(Json(m)))
}

/// `POST /api/mods` — register a new mod.
pub async fn create<RR, MR, SR, P, ES, SS>(
    State(state): State<AppState<RR, MR, SR, P, ES, SS>>,
    Json(req): Json<CreateModRequest>,
) -> Result<CreateResponse, ApiError>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    let mut builder = Mod::builder().name(req.name);
    if let Some(description) = req.description {
        builder = builder.description(description);
    }
    if let Some(active) = req.active {
        builder = builder.active(active);
    }

    let created = state.mod_service.create_mod(builder.build()?).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `DELETE /api/mods/{id}` — delete a mod.
pub async fn delete<RR, MR, SR, P, ES, SS>(
    State(state): State<AppState<RR, MR, SR, P, ES, SS>>,
    Path(id): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    state.mod_service.delete_mod(parse_id(&id)?).await?;
    Ok(DeleteResponse::NoContent)
}

/// `POST /api/mods/{id}/activate` — switch a mod on by hand.
pub async fn activate<RR, MR, SR, P, ES, SS>(
    State(state): State<AppState<RR, MR, SR, P, ES, SS>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    let m = state.mod_service.set_active(parse_id(&id)?, true).await?;
    Ok(GetResponse::Ok(Json(m)))
}

/// `POST /api/mods/{id}/deactivate` — switch a mod off by hand.
pub async fn deactivate<RR, MR, SR, P, ES, SS>(
    State(state): State<AppState<RR, MR, SR, P, ES, SS>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    let m = state.mod_service.set_active(parse_id(&id)?, false).await?;
    Ok(GetResponse::Ok(Json(m)))
}
