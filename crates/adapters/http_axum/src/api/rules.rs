//! JSON REST handlers for rules.
//!
//! Bodies use the rule wire shape. Conditions are checked on the way in, so
//! a malformed condition answers `400` with its position instead of being
//! stored.

use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use modhub_app::ports::{
    EventPublisher, EventStore, ModRepository, RuleRepository, SettingsRepository, SnapshotStore,
};
use modhub_app::services::rule_service::RuleSaved;
use modhub_domain::id::RuleId;
use modhub_domain::rule::{
    Rule, RulePatch, RulePatchRecord, RuleRecord, ValidationIssue, has_errors,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Rule>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get and run endpoints.
pub enum GetResponse {
    Ok(Json<Rule>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create, update and patch endpoints.
pub enum SaveResponse {
    Created(Json<RuleSaved>),
    Ok(Json<RuleSaved>),
}

impl IntoResponse for SaveResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
            Self::Ok(json) => json.into_response(),
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

/// Body of `POST /api/rules/validate`.
#[derive(Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    /// The rule as it would be stored.
    pub rule: Rule,
    pub issues: Vec<ValidationIssue>,
}

fn parse_id(id: &str) -> Result<RuleId, ApiError> {
    RuleId::from_str(id).map_err(|_| ApiError::invalid_id("rule", id))
}

/// `GET /api/rules` — list all rules.
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
    let rules = state.rule_service.list_rules().await?;
    Ok(ListResponse::Ok(Json(rules)))
}

/// `GET /api/rules/{id}` — get rule by ID.
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
    let rule = state.rule_service.get_rule(parse_id(&id)?).await?;
    Ok(GetResponse::Ok(Json(rule)))
}

/// `POST /api/rules` — create a new rule.
pub async fn create<RR, MR, SR, P, ES, SS>(
    State(state): State<AppState<RR, MR, SR, P, ES, SS>>,
    Json(record): Json<RuleRecord>,
) -> Result<SaveResponse, ApiError>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    let rule = Rule::try_from(record)?;
    let saved = state.rule_service.create_rule(rule).await?;
    Ok(SaveResponse::Created(Json(saved)))
}

/// `PUT /api/rules/{id}` — replace a rule's definition.
///
/// The id in the path wins over any id in the body.
pub async fn update<RR, MR, SR, P, ES, SS>(
    State(state): State<AppState<RR, MR, SR, P, ES, SS>>,
    Path(id): Path<String>,
    Json(record): Json<RuleRecord>,
) -> Result<SaveResponse, ApiError>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    let rule_id = parse_id(&id)?;
    let mut rule = Rule::try_from(record)?;
    rule.id = rule_id;
    let saved = state.rule_service.update_rule(rule).await?;
    Ok(SaveResponse::Ok(Json(saved)))
}

/// `PATCH /api/rules/{id}` — update some of a rule's fields.
pub async fn patch<RR, MR, SR, P, ES, SS>(
    State(state): State<AppState<RR, MR, SR, P, ES, SS>>,
    Path(id): Path<String>,
    Json(record): Json<RulePatchRecord>,
) -> Result<SaveResponse, ApiError>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    let id = parse_id(&id)?;
    let patch = RulePatch::try_from(record)?;
    let saved = state.rule_service.patch_rule(id, patch).await?;
    Ok(SaveResponse::Ok(Json(saved)))
}

/// `DELETE /api/rules/{id}` — delete a rule.
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
    state.rule_service.delete_rule(parse_id(&id)?).await?;
    Ok(DeleteResponse::NoContent)
}

/// `POST /api/rules/{id}/run` — execute a rule's actions now, ignoring
/// its conditions.
pub async fn run<RR, MR, SR, P, ES, SS>(
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
    let rule = state.engine.run_rule(parse_id(&id)?).await?;
    Ok(GetResponse::Ok(Json(rule)))
}

/// `POST /api/rules/validate` — normalize and validate without saving.
///
/// Always answers `200` for a readable rule; `valid` tells whether it
/// would be accepted.
pub async fn validate<RR, MR, SR, P, ES, SS>(
    State(state): State<AppState<RR, MR, SR, P, ES, SS>>,
    Json(record): Json<RuleRecord>,
) -> Result<Json<ValidationReport>, ApiError>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    let (rule, issues) = state.rule_service.validate(Rule::try_from(record)?);
    Ok(Json(ValidationReport {
        valid: !has_errors(&issues),
        rule,
        issues,
    }))
}
