//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use modhub_app::ports::{
    EventPublisher, EventStore, ModRepository, RuleRepository, SettingsRepository, SnapshotStore,
};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Mounts the API under `/api` next to a `/health` check. Includes a
/// [`TraceLayer`] that logs each HTTP request/response at the `DEBUG`
/// level using the `tracing` ecosystem.
pub fn build<RR, MR, SR, P, ES, SS>(state: AppState<RR, MR, SR, P, ES, SS>) -> Router
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use axum::body::Body;
    use axum::extract::State;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use modhub_adapter_memory::{
        MemoryEventStore, MemoryModRepository, MemoryRuleRepository, MemorySettingsRepository,
        MemorySnapshotStore,
    };
    use modhub_app::event_bus::InProcessEventBus;
    use modhub_app::rule_engine::RuleEngine;
    use modhub_app::services::mod_service::ModService;
    use modhub_app::services::rule_service::RuleService;
    use modhub_app::services::settings_service::SettingsService;
    use modhub_domain::event::{Event, EventType};
    use modhub_domain::id::RuleId;
    use modhub_domain::rule::{StaticCustomPredicate, ValidationPolicy};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    type TestState = AppState<
        Arc<MemoryRuleRepository>,
        Arc<MemoryModRepository>,
        Arc<MemorySettingsRepository>,
        InProcessEventBus,
        MemoryEventStore,
        MemorySnapshotStore,
    >;

    fn test_state() -> TestState {
        let rules = Arc::new(MemoryRuleRepository::new());
        let mods = Arc::new(MemoryModRepository::new());
        let settings = Arc::new(MemorySettingsRepository::new());
        let bus = InProcessEventBus::new(16);

        let custom = StaticCustomPredicate([("docked".to_string(), true)].into());
        let engine = RuleEngine::new(
            Arc::clone(&rules),
            Arc::clone(&mods),
            Arc::clone(&settings),
            bus.clone(),
        )
        .with_custom_predicate(custom);

        AppState::new(
            RuleService::new(rules, ValidationPolicy::default()),
            ModService::new(mods, bus.clone()),
            SettingsService::new(settings),
            engine,
            MemoryEventStore::new(100),
            MemorySnapshotStore::new(),
            bus,
        )
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    fn gaming_rule() -> Value {
        json!({
            "name": "Gaming",
            "priority": 10,
            "conditions": [{ "type": "process", "operation": "running", "value": "game.exe" }],
            "actions": [{ "type": "activate_mod", "target": "Gaming Mod" }]
        })
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let app = build(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_create_and_fetch_rule() {
        let app = build(test_state());

        let (status, saved) = send(&app, Method::POST, "/api/rules", Some(gaming_rule())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(saved["rule"]["name"], "Gaming");
        assert_eq!(saved["rule"]["isRunning"], false);
        assert_eq!(saved["warnings"], json!([]));

        let id = saved["rule"]["id"].as_str().unwrap();
        let (status, rule) = send(&app, Method::GET, &format!("/api/rules/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rule["priority"], 10);

        let (_, all) = send(&app, Method::GET, "/api/rules", None).await;
        assert_eq!(all.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_return_warnings_with_saved_rule() {
        let app = build(test_state());
        let mut rule = gaming_rule();
        rule["actions"] = json!([]);

        let (status, saved) = send(&app, Method::POST, "/api/rules", Some(rule)).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(saved["warnings"][0]["code"], "no_actions");
    }

    #[tokio::test]
    async fn should_reject_invalid_rule_with_issues() {
        let app = build(test_state());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/rules",
            Some(json!({ "name": "  ", "conditions": [] })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let codes: Vec<&str> = body["issues"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|issue| issue["code"].as_str())
            .collect();
        assert!(codes.contains(&"empty_name"));
        assert!(codes.contains(&"no_conditions"));
    }

    #[tokio::test]
    async fn should_reject_malformed_condition_with_position() {
        let app = build(test_state());
        let mut rule = gaming_rule();
        rule["conditions"] = json!([{ "type": "time", "operation": "sometime", "value": "22:00" }]);

        let (status, body) = send(&app, Method::POST, "/api/rules", Some(rule)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("condition #0"));
    }

    #[tokio::test]
    async fn should_answer_bad_request_for_invalid_id_and_not_found_for_unknown() {
        let app = build(test_state());

        let (status, _) = send(&app, Method::GET, "/api/rules/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let uri = format!("/api/rules/{}", RuleId::new());
        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn should_update_patch_and_delete_rule() {
        let app = build(test_state());
        let (_, saved) = send(&app, Method::POST, "/api/rules", Some(gaming_rule())).await;
        let uri = format!("/api/rules/{}", saved["rule"]["id"].as_str().unwrap());

        let mut replaced = gaming_rule();
        replaced["name"] = json!("Gaming (night)");
        let (status, body) = send(&app, Method::PUT, &uri, Some(replaced)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rule"]["name"], "Gaming (night)");

        let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "enabled": false }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rule"]["enabled"], false);
        assert_eq!(body["rule"]["name"], "Gaming (night)");

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_validate_rule_without_saving_it() {
        let app = build(test_state());
        let mut rule = gaming_rule();
        rule["name"] = json!("");

        let (status, report) = send(&app, Method::POST, "/api/rules/validate", Some(rule)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["valid"], false);
        assert_eq!(report["issues"][0]["code"], "empty_name");
        let (_, all) = send(&app, Method::GET, "/api/rules", None).await;
        assert_eq!(all, json!([]));
    }

    #[tokio::test]
    async fn should_report_zero_inactivity_threshold_as_issue() {
        let app = build(test_state());
        let mut rule = gaming_rule();
        rule["conditions"] = json!([{ "type": "inactivity", "thresholdMinutes": 0 }]);

        let (status, report) = send(&app, Method::POST, "/api/rules/validate", Some(rule)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["valid"], false);
        assert_eq!(report["issues"][0]["code"], "inactivity_out_of_range");
    }

    #[tokio::test]
    async fn should_reject_malformed_patch_condition_with_position() {
        let app = build(test_state());
        let (_, saved) = send(&app, Method::POST, "/api/rules", Some(gaming_rule())).await;
        let uri = format!("/api/rules/{}", saved["rule"]["id"].as_str().unwrap());
        let patch = json!({
            "conditions": [
                { "type": "process", "operation": "running", "value": "game.exe" },
                { "type": "process", "operation": "running" }
            ]
        });

        let (status, body) = send(&app, Method::PATCH, &uri, Some(patch)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("condition #1"));
        let (_, stored) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(stored["conditions"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn should_run_rule_and_activate_its_mod() {
        let app = build(test_state());
        let (status, created) = send(
            &app,
            Method::POST,
            "/api/mods",
            Some(json!({ "name": "Gaming Mod" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["active"], false);
        let (_, saved) = send(&app, Method::POST, "/api/rules", Some(gaming_rule())).await;
        let rule_id = saved["rule"]["id"].as_str().unwrap();

        let (status, rule) = send(&app, Method::POST, &format!("/api/rules/{rule_id}/run"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(rule["lastTriggered"].is_string());

        let mod_uri = format!("/api/mods/{}", created["id"].as_str().unwrap());
        let (_, m) = send(&app, Method::GET, &mod_uri, None).await;
        assert_eq!(m["active"], true);
    }

    #[tokio::test]
    async fn should_fail_run_when_target_mod_is_unknown() {
        let app = build(test_state());
        let (_, saved) = send(&app, Method::POST, "/api/rules", Some(gaming_rule())).await;
        let rule_id = saved["rule"]["id"].as_str().unwrap();

        let (status, _) = send(&app, Method::POST, &format!("/api/rules/{rule_id}/run"), None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_toggle_mod_by_hand() {
        let app = build(test_state());
        let (_, created) = send(&app, Method::POST, "/api/mods", Some(json!({ "name": "Night" }))).await;
        let uri = format!("/api/mods/{}", created["id"].as_str().unwrap());

        let (status, m) = send(&app, Method::POST, &format!("{uri}/activate"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(m["active"], true);

        let (_, m) = send(&app, Method::POST, &format!("{uri}/deactivate"), None).await;
        assert_eq!(m["active"], false);

        let (status, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, all) = send(&app, Method::GET, "/api/mods", None).await;
        assert_eq!(all, json!([]));
    }

    #[tokio::test]
    async fn should_reject_mod_without_name() {
        let app = build(test_state());

        let (status, _) = send(&app, Method::POST, "/api/mods", Some(json!({ "name": "" }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_dry_run_submitted_rules() {
        let app = build(test_state());
        let request = json!({
            "snapshot": { "now": "2026-10-17T23:00:00+01:00", "processes": ["Game.exe"] },
            "rules": [
                gaming_rule(),
                { "name": "Docked", "conditions": [{ "type": "custom", "description": "docked" }] },
                { "name": "Broken", "conditions": [{ "type": "warp" }] },
                { "name": "Idle", "conditions": [{ "type": "inactivity", "thresholdMinutes": 5 }] }
            ]
        });

        let (status, body) = send(&app, Method::POST, "/api/evaluate", Some(request)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["triggered"].as_array().unwrap().len(), 2);
        assert_eq!(body["rules"].as_array().unwrap().len(), 3);
        assert_eq!(body["rules"][0]["name"], "Gaming");
        assert_eq!(body["rules"][0]["conditions"][0]["satisfied"], true);
        assert_eq!(body["skipped"][0]["index"], 2);
    }

    #[tokio::test]
    async fn should_dry_run_stored_rules_when_none_submitted() {
        let app = build(test_state());
        send(&app, Method::POST, "/api/rules", Some(gaming_rule())).await;
        let request = json!({ "snapshot": { "now": "2026-10-17T12:00:00Z", "processes": [] } });

        let (status, body) = send(&app, Method::POST, "/api/evaluate", Some(request)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["triggered"], json!([]));
        assert_eq!(body["rules"][0]["satisfied"], false);
        assert_eq!(body["skipped"], json!([]));
    }

    #[tokio::test]
    async fn should_write_and_read_settings() {
        let app = build(test_state());

        let (status, _) = send(&app, Method::GET, "/api/settings/fanSpeed", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, setting) = send(
            &app,
            Method::PUT,
            "/api/settings/fanSpeed",
            Some(json!({ "value": 80 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(setting["value"], 80);

        let (_, all) = send(&app, Method::GET, "/api/settings", None).await;
        assert_eq!(all[0]["key"], "fanSpeed");
    }

    #[tokio::test]
    async fn should_store_latest_snapshot() {
        let app = build(test_state());

        let (status, _) = send(&app, Method::GET, "/api/system/snapshot", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let snapshot = json!({ "now": "2026-10-17T08:15:00Z", "processes": ["steam.exe"], "idleMinutes": 3 });
        let (status, _) = send(&app, Method::PUT, "/api/system/snapshot", Some(snapshot)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, latest) = send(&app, Method::GET, "/api/system/snapshot", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(latest["processes"], json!(["steam.exe"]));
    }

    #[tokio::test]
    async fn should_list_events_and_filter_by_rule() {
        let state = test_state();
        let rule_id = RuleId::new();
        let fired = Event::new(EventType::RuleTriggered, Some(rule_id), json!({"name": "Gaming"}));
        let fired_id = fired.id;
        state.event_store.store(fired).await.unwrap();
        state
            .event_store
            .store(Event::new(EventType::SettingAdjusted, None, json!({"key": "fanSpeed"})))
            .await
            .unwrap();
        let app = build(state);

        let (_, all) = send(&app, Method::GET, "/api/events", None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);
        assert_eq!(all[0]["eventType"], "setting_adjusted");

        let (_, limited) = send(&app, Method::GET, "/api/events?limit=1", None).await;
        assert_eq!(limited.as_array().unwrap().len(), 1);

        let (_, by_rule) = send(&app, Method::GET, &format!("/api/events?ruleId={rule_id}"), None).await;
        assert_eq!(by_rule.as_array().unwrap().len(), 1);
        assert_eq!(by_rule[0]["id"], fired_id.to_string());

        let (status, event) = send(&app, Method::GET, &format!("/api/events/{fired_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(event["eventType"], "rule_triggered");
    }

    #[tokio::test]
    async fn should_subscribe_to_event_bus_when_stream_opened() {
        let state = test_state();
        let bus = state.event_bus.clone();
        let mut rx = bus.subscribe();

        let _sse = crate::api::sse::stream(State(state)).await;

        let event = Event::new(EventType::ModActivated, None, json!({"name": "Night"}));
        let event_id = event.id;
        bus.publish(event).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, event_id);
        assert_eq!(received.event_type, EventType::ModActivated);
    }
}
