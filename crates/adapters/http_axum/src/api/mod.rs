//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod evaluate;
#[allow(clippy::missing_errors_doc)]
pub mod events;
#[allow(clippy::missing_errors_doc)]
pub mod mods;
#[allow(clippy::missing_errors_doc)]
pub mod rules;
#[allow(clippy::missing_errors_doc)]
pub mod settings;
pub mod sse;
#[allow(clippy::missing_errors_doc)]
pub mod system;

use axum::Router;
use axum::routing::{get, post};

use modhub_app::ports::{
    EventPublisher, EventStore, ModRepository, RuleRepository, SettingsRepository, SnapshotStore,
};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<RR, MR, SR, P, ES, SS>() -> Router<AppState<RR, MR, SR, P, ES, SS>>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    Router::new()
        // Rules
        .route(
            "/rules",
            get(rules::list::<RR, MR, SR, P, ES, SS>).post(rules::create::<RR, MR, SR, P, ES, SS>),
        )
        .route(
            "/rules/validate",
            post(rules::validate::<RR, MR, SR, P, ES, SS>),
        )
        .route(
            "/rules/{id}",
            get(rules::get::<RR, MR, SR, P, ES, SS>)
                .put(rules::update::<RR, MR, SR, P, ES, SS>)
                .patch(rules::patch::<RR, MR, SR, P, ES, SS>)
                .delete(rules::delete::<RR, MR, SR, P, ES, SS>),
        )
        .route("/rules/{id}/run", post(rules::run::<RR, MR, SR, P, ES, SS>))
        // Dry run
        .route("/evaluate", post(evaluate::evaluate::<RR, MR, SR, P, ES, SS>))
        // Mods
        .route(
            "/mods",
            get(mods::list::<RR, MR, SR, P, ES, SS>).post(mods::create::<RR, MR, SR, P, ES, SS>),
        )
        .route(
            "/mods/{id}",
            get(mods::get::<RR, MR, SR, P, ES, SS>).delete(mods::delete::<RR, MR, SR, P, ES, SS>),
        )
        .route(
            "/mods/{id}/activate",
            post(mods::activate::<RR, MR, SR, P, ES, SS>),
        )
        .route(
            "/mods/{id}/deactivate",
            post(mods::deactivate::<RR, MR, SR, P, ES, SS>),
        )
        // Settings
        .route("/settings", get(settings::list::<RR, MR, SR, P, ES, SS>))
        .route(
            "/settings/{key}",
            get(settings::get::<RR, MR, SR, P, ES, SS>).put(settings::put::<RR, MR, SR, P, ES, SS>),
        )
        // System snapshot
        .route(
            "/system/snapshot",
            get(system::get_snapshot::<RR, MR, SR, P, ES, SS>)
                .put(system::put_snapshot::<RR, MR, SR, P, ES, SS>),
        )
        // Events
        .route("/events", get(events::list::<RR, MR, SR, P, ES, SS>))
        .route("/events/stream", get(sse::stream::<RR, MR, SR, P, ES, SS>))
        .route("/events/{id}", get(events::get::<RR, MR, SR, P, ES, SS>))
}
