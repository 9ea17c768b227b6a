//! In-memory port fakes shared by the unit tests of this crate.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Mutex;

use modhub_domain::error::{ModHubError, NotFoundError};
use modhub_domain::event::{Event, EventType};
use modhub_domain::id::{ModId, RuleId};
use modhub_domain::mods::Mod;
use modhub_domain::rule::{Rule, RunState};
use modhub_domain::setting::Setting;
use modhub_domain::snapshot::SystemSnapshot;

use crate::ports::{
    EventPublisher, ModRepository, RuleRepository, SettingsRepository, SnapshotStore,
};

// ── Rules ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryRuleRepo {
    store: Mutex<HashMap<RuleId, Rule>>,
}

impl InMemoryRuleRepo {
    pub fn with(rules: Vec<Rule>) -> Self {
        let map: HashMap<_, _> = rules.into_iter().map(|r| (r.id, r)).collect();
        Self {
            store: Mutex::new(map),
        }
    }

    pub fn snapshot_of(&self, id: RuleId) -> Rule {
        self.store.lock().unwrap()[&id].clone()
    }
}

impl RuleRepository for InMemoryRuleRepo {
    fn create(&self, rule: Rule) -> impl Future<Output = Result<Rule, ModHubError>> + Send {
        self.store.lock().unwrap().insert(rule.id, rule.clone());
        async { Ok(rule) }
    }

    fn get_by_id(
        &self,
        id: RuleId,
    ) -> impl Future<Output = Result<Option<Rule>, ModHubError>> + Send {
        let r = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(r) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Rule>, ModHubError>> + Send {
        let r: Vec<_> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(r) }
    }

    fn update(&self, mut rule: Rule) -> impl Future<Output = Result<Rule, ModHubError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = match store.get_mut(&rule.id) {
            Some(slot) => {
                rule.is_running = slot.is_running;
                rule.last_triggered = slot.last_triggered;
                *slot = rule.clone();
                Ok(rule)
            }
            None => Err(not_found(rule.id)),
        };
        async { result }
    }

    fn set_run_state(
        &self,
        id: RuleId,
        state: RunState,
    ) -> impl Future<Output = Result<Rule, ModHubError>> + Send {
        let mut store = self.store.lock().unwrap();
        let result = match store.get_mut(&id) {
            Some(slot) => {
                state.apply_to(slot);
                Ok(slot.clone())
            }
            None => Err(not_found(id)),
        };
        async { result }
    }

    fn delete(&self, id: RuleId) -> impl Future<Output = Result<(), ModHubError>> + Send {
        self.store.lock().unwrap().remove(&id);
        async { Ok(()) }
    }
}

fn not_found(id: RuleId) -> ModHubError {
    NotFoundError {
        entity: "Rule",
        id: id.to_string(),
    }
    .into()
}

// ── Mods ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryModRepo {
    store: Mutex<HashMap<ModId, Mod>>,
}

impl InMemoryModRepo {
    pub fn with(mods: Vec<Mod>) -> Self {
        let map: HashMap<_, _> = mods.into_iter().map(|m| (m.id, m)).collect();
        Self {
            store: Mutex::new(map),
        }
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.store
            .lock()
            .unwrap()
            .values()
            .any(|m| m.name == name && m.active)
    }
}

impl ModRepository for InMemoryModRepo {
    fn create(&self, m: Mod) -> impl Future<Output = Result<Mod, ModHubError>> + Send {
        self.store.lock().unwrap().insert(m.id, m.clone());
        async { Ok(m) }
    }

    fn get_by_id(
        &self,
        id: ModId,
    ) -> impl Future<Output = Result<Option<Mod>, ModHubError>> + Send {
        let r = self.store.lock().unwrap().get(&id).cloned();
        async { Ok(r) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Mod>, ModHubError>> + Send {
        let r: Vec<_> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(r) }
    }

    fn find_by_target(
        &self,
        target: &str,
    ) -> impl Future<Output = Result<Option<Mod>, ModHubError>> + Send {
        let r = self
            .store
            .lock()
            .unwrap()
            .values()
            .find(|m| m.matches_target(target))
            .cloned();
        async { Ok(r) }
    }

    fn update(&self, m: Mod) -> impl Future<Output = Result<Mod, ModHubError>> + Send {
        self.store.lock().unwrap().insert(m.id, m.clone());
        async { Ok(m) }
    }

    fn delete(&self, id: ModId) -> impl Future<Output = Result<(), ModHubError>> + Send {
        self.store.lock().unwrap().remove(&id);
        async { Ok(()) }
    }
}

// ── Settings ───────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemorySettingsRepo {
    store: Mutex<BTreeMap<String, Setting>>,
}

impl InMemorySettingsRepo {
    pub fn value_of(&self, key: &str) -> Option<serde_json::Value> {
        self.store.lock().unwrap().get(key).map(|s| s.value.clone())
    }
}

impl SettingsRepository for InMemorySettingsRepo {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<Setting>, ModHubError>> + Send {
        let r = self.store.lock().unwrap().get(key).cloned();
        async { Ok(r) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Setting>, ModHubError>> + Send {
        let r: Vec<_> = self.store.lock().unwrap().values().cloned().collect();
        async { Ok(r) }
    }

    fn put(&self, setting: Setting) -> impl Future<Output = Result<Setting, ModHubError>> + Send {
        self.store
            .lock()
            .unwrap()
            .insert(setting.key.clone(), setting.clone());
        async { Ok(setting) }
    }
}

// ── Snapshots ──────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemorySnapshotStore {
    latest: Mutex<Option<SystemSnapshot>>,
}

impl SnapshotStore for InMemorySnapshotStore {
    fn latest(&self) -> impl Future<Output = Result<Option<SystemSnapshot>, ModHubError>> + Send {
        let r = self.latest.lock().unwrap().clone();
        async { Ok(r) }
    }

    fn replace(
        &self,
        snapshot: SystemSnapshot,
    ) -> impl Future<Output = Result<(), ModHubError>> + Send {
        *self.latest.lock().unwrap() = Some(snapshot);
        async { Ok(()) }
    }
}

// ── Spy publisher ──────────────────────────────────────────────

#[derive(Default)]
pub struct SpyPublisher {
    events: Mutex<Vec<Event>>,
}

impl SpyPublisher {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn types(&self) -> Vec<EventType> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type)
            .collect()
    }
}

impl EventPublisher for SpyPublisher {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), ModHubError>> + Send {
        self.events.lock().unwrap().push(event);
        async { Ok(()) }
    }
}
