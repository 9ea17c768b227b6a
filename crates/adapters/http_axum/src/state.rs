//! Shared application state for axum handlers.

use std::sync::Arc;

use modhub_app::event_bus::InProcessEventBus;
use modhub_app::ports::{
    EventPublisher, EventStore, ModRepository, RuleRepository, SettingsRepository, SnapshotStore,
};
use modhub_app::rule_engine::RuleEngine;
use modhub_app::services::mod_service::ModService;
use modhub_app::services::rule_service::RuleService;
use modhub_app::services::settings_service::SettingsService;

/// Application state shared across all axum handlers.
///
/// Generic over the rule, mod and settings repositories, the event
/// publisher, the event store and the snapshot store to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<RR, MR, SR, P, ES, SS> {
    /// Rule CRUD and validation.
    pub rule_service: Arc<RuleService<RR>>,
    /// Mod registry and manual toggling.
    pub mod_service: Arc<ModService<MR, P>>,
    pub settings_service: Arc<SettingsService<SR>>,
    /// Engine used for manual runs and for its custom-condition predicate.
    pub engine: Arc<RuleEngine<RR, MR, SR, P>>,
    /// Event store for querying recorded events.
    pub event_store: Arc<ES>,
    /// Latest snapshot reported by the host.
    pub snapshot_store: Arc<SS>,
    /// Bus the SSE stream subscribes to.
    pub event_bus: InProcessEventBus,
}

impl<RR, MR, SR, P, ES, SS> Clone for AppState<RR, MR, SR, P, ES, SS> {
    fn clone(&self) -> Self {
        Self {
            rule_service: Arc::clone(&self.rule_service),
            mod_service: Arc::clone(&self.mod_service),
            settings_service: Arc::clone(&self.settings_service),
            engine: Arc::clone(&self.engine),
            event_store: Arc::clone(&self.event_store),
            snapshot_store: Arc::clone(&self.snapshot_store),
            event_bus: self.event_bus.clone(),
        }
    }
}

impl<RR, MR, SR, P, ES, SS> AppState<RR, MR, SR, P, ES, SS>
where
    RR: RuleRepository + Send + Sync + 'static,
    MR: ModRepository + Send + Sync + 'static,
    SR: SettingsRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
    ES: EventStore + Send + Sync + 'static,
    SS: SnapshotStore + Send + Sync + 'static,
{
    /// Create a new application state from service instances.
    pub fn new(
        rule_service: RuleService<RR>,
        mod_service: ModService<MR, P>,
        settings_service: SettingsService<SR>,
        engine: RuleEngine<RR, MR, SR, P>,
        event_store: ES,
        snapshot_store: SS,
        event_bus: InProcessEventBus,
    ) -> Self {
        Self {
            rule_service: Arc::new(rule_service),
            mod_service: Arc::new(mod_service),
            settings_service: Arc::new(settings_service),
            engine: Arc::new(engine),
            event_store: Arc::new(event_store),
            snapshot_store: Arc::new(snapshot_store),
            event_bus,
        }
    }

    /// Create a new application state from pre-wrapped `Arc`s.
    ///
    /// Use this when the engine or the stores are shared with background
    /// tasks before constructing the HTTP state.
    pub fn from_arcs(
        rule_service: Arc<RuleService<RR>>,
        mod_service: Arc<ModService<MR, P>>,
        settings_service: Arc<SettingsService<SR>>,
        engine: Arc<RuleEngine<RR, MR, SR, P>>,
        event_store: Arc<ES>,
        snapshot_store: Arc<SS>,
        event_bus: InProcessEventBus,
    ) -> Self {
        Self {
            rule_service,
            mod_service,
            settings_service,
            engine,
            event_store,
            snapshot_store,
            event_bus,
        }
    }
}
