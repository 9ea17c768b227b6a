//! JSON REST handlers for events.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use modhub_app::ports::{
    EventPublisher, EventStore, ModRepository, RuleRepository, SettingsRepository, SnapshotStore,
};
use modhub_domain::error::{ModHubError, NotFoundError};
use modhub_domain::event::Event;
use modhub_domain::id::{EventId, RuleId};

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 1000;

/// Query parameters of `GET /api/events`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsQuery {
    pub limit: Option<usize>,
    /// Only events caused by this rule.
    pub rule_id: Option<String>,
}

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Event>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<Event>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/events` — list recent events, newest first.
pub async fn list<RR, MR, SR, P, ES, SS>(
    State(state): State<AppState<RR, MR, SR, P, ES, SS>>,
    Query(query): Query<EventsQuery>,
) -> Result<ListResponse, ApiError>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let events = match query.rule_id {
        Some(raw) => {
            let rule_id =
                RuleId::from_str(&raw).map_err(|_| ApiError::invalid_id("rule", &raw))?;
            state.event_store.find_by_rule(rule_id, limit).await?
        }
        None => state.event_store.get_recent(limit).await?,
    };
    Ok(ListResponse::Ok(Json(events)))
}

/// `GET /api/events/{id}` — get event by ID.
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
    let event_id = EventId::from_str(&id).map_err(|_| ApiError::invalid_id("event", &id))?;
    let event = state
        .event_store
        .get_by_id(event_id)
        .await?
        .ok_or_else(|| {
            ApiError::from(ModHubError::NotFound(NotFoundError {
                entity: "Event",
                id,
            }))
        })?;
    Ok(GetResponse::Ok(Json(event)))
}
