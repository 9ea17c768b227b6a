//! Dry-run evaluation: which rules a snapshot would trigger, condition by
//! condition, without dispatching anything.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use modhub_app::ports::{
    EventPublisher, EventStore, ModRepository, RuleRepository, SettingsRepository, SnapshotStore,
};
use modhub_domain::id::RuleId;
use modhub_domain::rule::{
    ParsedRules, RuleEvaluation, SkippedRule, explain, find_triggered_rules, parse_rules,
};
use modhub_domain::snapshot::SystemSnapshot;

use crate::error::ApiError;
use crate::state::AppState;

/// Body of `POST /api/evaluate`.
#[derive(Deserialize)]
pub struct EvaluateRequest {
    pub snapshot: SystemSnapshot,
    /// Rules in wire form. The stored rules are used when absent.
    #[serde(default)]
    pub rules: Option<Vec<serde_json::Value>>,
}

#[derive(Serialize)]
pub struct EvaluateResponse {
    /// Triggered rule ids, in precedence order.
    pub triggered: Vec<RuleId>,
    pub rules: Vec<RuleEvaluation>,
    /// Submitted rules that could not be read.
    pub skipped: Vec<SkippedRule>,
}

/// `POST /api/evaluate` — evaluate rules against a snapshot.
pub async fn evaluate<RR, MR, SR, P, ES, SS>(
    State(state): State<AppState<RR, MR, SR, P, ES, SS>>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, ApiError>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    let ParsedRules { rules, skipped } = match req.rules {
        Some(values) => parse_rules(values),
        None => ParsedRules {
            rules: state.rule_service.list_rules().await?,
            skipped: Vec::new(),
        },
    };

    let custom = state.engine.custom_predicate();
    let triggered = find_triggered_rules(&rules, &req.snapshot, custom)
        .into_iter()
        .map(|rule| rule.id)
        .collect();
    let evaluations = explain(&rules, &req.snapshot, custom);

    Ok(Json(EvaluateResponse {
        triggered,
        rules: evaluations,
        skipped,
    }))
}
