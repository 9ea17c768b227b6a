//! Rule engine — evaluates rules against system snapshots and dispatches
//! their actions.
//!
//! Each [`RuleEngine::tick`] is edge-triggered: a rule's actions run when it
//! becomes satisfied, and the rule stays `isRunning` until its conditions
//! stop holding. Conflicts between satisfied rules are settled by
//! [`plan_dispatch`]: the rule first in precedence order owns a mod or
//! setting for the whole tick, even if it fired on an earlier tick. When an
//! owner is released, the next running rule in order takes over its mods
//! and settings and its suppressed actions run.
//!
//! A rule whose dispatch fails is held back until its conditions stop
//! holding, so a failing rule is reported once per activation.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;

use modhub_domain::error::{ModHubError, NotFoundError};
use modhub_domain::event::{Event, EventType};
use modhub_domain::id::RuleId;
use modhub_domain::mods::Mod;
use modhub_domain::rule::{
    Action, ConflictKey, CustomPredicate, NoCustomPredicate, Rule, RunState,
    find_triggered_rules, plan_dispatch, precedence,
};
use modhub_domain::setting::Setting;
use modhub_domain::snapshot::SystemSnapshot;
use modhub_domain::time::now;

use crate::ports::{
    EventPublisher, ModRepository, RuleRepository, SettingsRepository, SnapshotStore,
};

/// Polling parameters for [`RuleEngine::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub scan_interval: Duration,
    /// Snapshots older than this are ignored. `None` accepts any age.
    pub max_snapshot_age: Option<Duration>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(5),
            max_snapshot_age: Some(Duration::from_secs(30)),
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Rules loaded for evaluation.
    pub evaluated: usize,
    /// Rules whose actions ran this tick.
    pub triggered: Vec<RuleId>,
    /// Running rules that stopped matching.
    pub released: Vec<RuleId>,
    /// Rules with a failing action.
    pub failed: Vec<RuleId>,
    /// Actions dropped in favor of a higher-precedence rule.
    pub suppressed: usize,
    /// Previously suppressed actions run after their owner was released.
    pub taken_over: usize,
}

/// Evaluates rules against snapshots and executes the winning actions.
pub struct RuleEngine<RR, MR, SR, P> {
    rule_repo: RR,
    mod_repo: MR,
    settings_repo: SR,
    publisher: P,
    custom: Box<dyn CustomPredicate + Send + Sync>,
    /// Matching rules whose dispatch failed.
    held: Mutex<HashSet<RuleId>>,
}

impl<RR, MR, SR, P> RuleEngine<RR, MR, SR, P>
where
    RR: RuleRepository + Sync,
    MR: ModRepository + Sync,
    SR: SettingsRepository + Sync,
    P: EventPublisher + Sync,
{
    /// Create a new engine. Custom conditions are never satisfied until a
    /// predicate is set with [`RuleEngine::with_custom_predicate`].
    pub fn new(rule_repo: RR, mod_repo: MR, settings_repo: SR, publisher: P) -> Self {
        Self {
            rule_repo,
            mod_repo,
            settings_repo,
            publisher,
            custom: Box::new(NoCustomPredicate),
            held: Mutex::new(HashSet::new()),
        }
    }

    #[must_use]
    pub fn with_custom_predicate(
        mut self,
        custom: impl CustomPredicate + Send + Sync + 'static,
    ) -> Self {
        self.custom = Box::new(custom);
        self
    }

    /// The predicate resolving `custom` conditions.
    pub fn custom_predicate(&self) -> &(dyn CustomPredicate + Send + Sync) {
        self.custom.as_ref()
    }

    /// Evaluate every rule against `snapshot` and dispatch.
    ///
    /// One failing rule never stops the tick: it is reported in
    /// [`TickReport::failed`], published as [`EventType::RuleFailed`] and
    /// retried once its conditions have stopped holding and hold again.
    ///
    /// # Errors
    ///
    /// Returns a storage error only if the rules cannot be loaded.
    #[tracing::instrument(skip_all)]
    pub async fn tick(&self, snapshot: &SystemSnapshot) -> Result<TickReport, ModHubError> {
        let rules = self.rule_repo.get_all().await?;
        let matched = find_triggered_rules(&rules, snapshot, self.custom.as_ref());
        let matched_ids: HashSet<RuleId> = matched.iter().map(|r| r.id).collect();

        let mut report = TickReport {
            evaluated: rules.len(),
            ..TickReport::default()
        };

        let held = {
            let mut held = self.held.lock().await;
            held.retain(|id| matched_ids.contains(id));
            held.clone()
        };

        // ownership as it stood among the rules running before this tick
        let mut running: Vec<&Rule> = rules.iter().filter(|r| r.is_running).collect();
        running.sort_by(|a, b| precedence(a, b));
        let previous = plan_dispatch(&running);

        let mut freed: HashSet<ConflictKey> = HashSet::new();
        for rule in running
            .iter()
            .filter(|r| !matched_ids.contains(&r.id))
        {
            self.release(rule).await;
            freed.extend(previous.owned_by(rule.id));
            report.released.push(rule.id);
        }

        let plan = plan_dispatch(&matched);

        if !freed.is_empty() {
            for rule in matched.iter().filter(|r| r.is_running) {
                let taken: Vec<&Action> = plan
                    .planned_for(rule.id)
                    .filter(|a| a.conflict_key().is_some_and(|key| freed.contains(&key)))
                    .collect();
                if taken.is_empty() {
                    continue;
                }
                tracing::info!(
                    rule_id = %rule.id,
                    rule_name = %rule.name,
                    actions = taken.len(),
                    "taking over released targets"
                );
                match self.dispatch(rule.id, &taken).await {
                    Ok(()) => report.taken_over += taken.len(),
                    Err(err) => self.fail(rule, &err, &mut report).await,
                }
            }
        }

        for rule in matched
            .iter()
            .filter(|r| !r.is_running && !held.contains(&r.id))
        {
            for suppressed in plan.suppressed_for(rule.id) {
                report.suppressed += 1;
                tracing::debug!(
                    rule_id = %rule.id,
                    winner = %suppressed.winner,
                    action = %suppressed.action,
                    "action suppressed"
                );
                self.emit(Event::new(
                    EventType::ActionSuppressed,
                    Some(rule.id),
                    serde_json::json!({
                        "action": suppressed.action,
                        "winner": suppressed.winner,
                    }),
                ))
                .await;
            }

            let actions: Vec<&Action> = plan.planned_for(rule.id).collect();
            match self.dispatch(rule.id, &actions).await {
                Ok(()) => {
                    self.mark_triggered(rule).await;
                    report.triggered.push(rule.id);
                }
                Err(err) => self.fail(rule, &err, &mut report).await,
            }
        }

        tracing::debug!(
            evaluated = report.evaluated,
            triggered = report.triggered.len(),
            released = report.released.len(),
            failed = report.failed.len(),
            suppressed = report.suppressed,
            taken_over = report.taken_over,
            "tick complete"
        );
        Ok(report)
    }

    /// Execute a rule's actions now, ignoring its conditions.
    ///
    /// Sets `lastTriggered` but not `isRunning`.
    ///
    /// # Errors
    ///
    /// Returns [`ModHubError::NotFound`] if the rule or one of its target
    /// mods does not exist, or the first failing action's error.
    #[tracing::instrument(skip(self))]
    pub async fn run_rule(&self, id: RuleId) -> Result<Rule, ModHubError> {
        let rule = self
            .rule_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "Rule",
                id: id.to_string(),
            })?;

        let actions: Vec<&Action> = rule.actions.iter().collect();
        if let Err(err) = self.dispatch(rule.id, &actions).await {
            self.emit(Event::new(
                EventType::RuleFailed,
                Some(rule.id),
                serde_json::json!({"name": rule.name, "error": err.to_string(), "manual": true}),
            ))
            .await;
            return Err(err);
        }

        let rule = self
            .rule_repo
            .set_run_state(rule.id, RunState::ran(now()))
            .await?;
        tracing::info!(rule_id = %rule.id, rule_name = %rule.name, "rule run manually");
        self.emit(Event::new(
            EventType::RuleTriggered,
            Some(rule.id),
            serde_json::json!({"name": rule.name, "manual": true}),
        ))
        .await;
        Ok(rule)
    }

    /// Poll `snapshots` every scan interval and tick on the latest snapshot
    /// until `shutdown` resolves.
    ///
    /// Missing or stale snapshots skip the tick. Storage errors are logged
    /// and the loop carries on.
    pub async fn run<S, F>(&self, snapshots: &S, options: EngineOptions, shutdown: F)
    where
        S: SnapshotStore + Sync,
        F: Future<Output = ()> + Send,
    {
        let mut interval = tokio::time::interval(options.scan_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("rule engine stopping");
                    break;
                }
                _ = interval.tick() => {
                    self.poll_once(snapshots, options).await;
                }
            }
        }
    }

    async fn poll_once<S: SnapshotStore + Sync>(&self, snapshots: &S, options: EngineOptions) {
        let snapshot = match snapshots.latest().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::debug!("no snapshot reported yet, skipping tick");
                return;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to read snapshot");
                return;
            }
        };

        if let Some(max_age) = options.max_snapshot_age
            && is_stale(&snapshot, max_age)
        {
            tracing::debug!(taken_at = %snapshot.now, "snapshot is stale, skipping tick");
            return;
        }

        if let Err(err) = self.tick(&snapshot).await {
            tracing::warn!(error = %err, "tick failed");
        }
    }

    async fn release(&self, rule: &Rule) {
        if let Err(err) = self
            .rule_repo
            .set_run_state(rule.id, RunState::released())
            .await
        {
            tracing::warn!(rule_id = %rule.id, error = %err, "failed to release rule");
            return;
        }
        tracing::info!(rule_id = %rule.id, rule_name = %rule.name, "rule released");
        self.emit(Event::new(
            EventType::RuleReleased,
            Some(rule.id),
            serde_json::json!({"name": rule.name}),
        ))
        .await;
    }

    async fn mark_triggered(&self, rule: &Rule) {
        if let Err(err) = self
            .rule_repo
            .set_run_state(rule.id, RunState::triggered(now()))
            .await
        {
            tracing::warn!(rule_id = %rule.id, error = %err, "failed to store rule state");
        }
        tracing::info!(rule_id = %rule.id, rule_name = %rule.name, priority = rule.priority, "rule triggered");
        self.emit(Event::new(
            EventType::RuleTriggered,
            Some(rule.id),
            serde_json::json!({"name": rule.name, "priority": rule.priority}),
        ))
        .await;
    }

    async fn fail(&self, rule: &Rule, err: &ModHubError, report: &mut TickReport) {
        tracing::warn!(rule_id = %rule.id, rule_name = %rule.name, error = %err, "rule dispatch failed");
        self.held.lock().await.insert(rule.id);
        self.emit(Event::new(
            EventType::RuleFailed,
            Some(rule.id),
            serde_json::json!({"name": rule.name, "error": err.to_string()}),
        ))
        .await;
        report.failed.push(rule.id);
    }

    /// Run `actions` in order, once every mod they target resolves.
    ///
    /// An unknown target fails the rule before any action ran.
    async fn dispatch(&self, rule_id: RuleId, actions: &[&Action]) -> Result<(), ModHubError> {
        for action in actions {
            if let Action::ActivateMod { target } | Action::DeactivateMod { target } = action {
                self.resolve_mod(target).await?;
            }
        }
        for action in actions {
            self.execute_action(rule_id, action).await?;
        }
        Ok(())
    }

    /// Execute a single action.
    async fn execute_action(&self, rule_id: RuleId, action: &Action) -> Result<(), ModHubError> {
        match action {
            Action::ActivateMod { target } => self.switch_mod(rule_id, target, true).await,
            Action::DeactivateMod { target } => self.switch_mod(rule_id, target, false).await,
            Action::AdjustSetting { target, value } => {
                let setting = self
                    .settings_repo
                    .put(Setting::new(target.trim(), value.clone()))
                    .await?;
                self.emit(Event::new(
                    EventType::SettingAdjusted,
                    Some(rule_id),
                    serde_json::json!({"key": setting.key, "value": setting.value}),
                ))
                .await;
                Ok(())
            }
            Action::RunCommand { target, value } => {
                self.request(EventType::CommandRequested, rule_id, target, value.as_ref())
                    .await
            }
            Action::Notify { target, value } => {
                self.request(EventType::NotificationRequested, rule_id, target, value.as_ref())
                    .await
            }
            Action::Custom { target, value } => {
                self.request(EventType::CustomActionRequested, rule_id, target, value.as_ref())
                    .await
            }
        }
    }

    async fn resolve_mod(&self, target: &str) -> Result<Mod, ModHubError> {
        self.mod_repo
            .find_by_target(target)
            .await?
            .ok_or_else(|| {
                NotFoundError {
                    entity: "Mod",
                    id: target.to_string(),
                }
                .into()
            })
    }

    async fn switch_mod(
        &self,
        rule_id: RuleId,
        target: &str,
        active: bool,
    ) -> Result<(), ModHubError> {
        let mut m = self.resolve_mod(target).await?;
        if !m.set_active(active, now()) {
            return Ok(());
        }
        let m = self.mod_repo.update(m).await?;
        let event_type = if active {
            EventType::ModActivated
        } else {
            EventType::ModDeactivated
        };
        self.emit(Event::new(
            event_type,
            Some(rule_id),
            serde_json::json!({"modId": m.id, "name": m.name}),
        ))
        .await;
        Ok(())
    }

    /// Hand an action to the host. Publishing is the action itself, so a
    /// publish failure fails the action.
    async fn request(
        &self,
        event_type: EventType,
        rule_id: RuleId,
        target: &str,
        value: Option<&serde_json::Value>,
    ) -> Result<(), ModHubError> {
        self.publisher
            .publish(Event::new(
                event_type,
                Some(rule_id),
                serde_json::json!({"target": target, "value": value}),
            ))
            .await
    }

    async fn emit(&self, event: Event) {
        if let Err(err) = self.publisher.publish(event).await {
            tracing::warn!(error = %err, "failed to publish event");
        }
    }
}

fn is_stale(snapshot: &SystemSnapshot, max_age: Duration) -> bool {
    let age = now().signed_duration_since(snapshot.now);
    age.to_std().is_ok_and(|age| age > max_age)
}
