//! # modhubd — modhub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`modhub.toml`, env vars) and initialize logging
//! - Open the `SQLite` database (running migrations) and seed it on first
//!   start; the latest system snapshot stays in memory
//! - Construct application services and the rule engine, injecting
//!   repositories via port traits
//! - Spawn the event recorder and the engine's polling loop
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (Ctrl-C)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use modhub_adapter_http_axum::state::AppState;
use modhub_adapter_memory::{MemorySnapshotStore, Seed};
use modhub_adapter_storage_sqlite_sqlx::{
    Config as DbConfig, SqliteEventStore, SqliteModRepository, SqliteRuleRepository,
    SqliteSettingsRepository,
};
use modhub_app::event_bus::{InProcessEventBus, record_events};
use modhub_app::rule_engine::RuleEngine;
use modhub_app::services::mod_service::ModService;
use modhub_app::services::rule_service::RuleService;
use modhub_app::services::settings_service::SettingsService;

use crate::config::Config;

const EVENT_BUS_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    let filter =
        EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Storage
    let db = DbConfig {
        database_url: config.database.url.clone(),
    }
    .build()
    .await
    .context("failed to initialize database")?;
    tracing::info!(url = %config.database.url, "database ready");

    let pool = db.pool().clone();
    let rule_repo = Arc::new(SqliteRuleRepository::new(pool.clone()));
    let mod_repo = Arc::new(SqliteModRepository::new(pool.clone()));
    let settings_repo = Arc::new(SqliteSettingsRepository::new(pool.clone()));
    let event_store = Arc::new(SqliteEventStore::new(
        pool,
        config.storage.event_log_capacity,
    ));
    let snapshot_store = Arc::new(MemorySnapshotStore::new());

    let policy = config.validation_policy();
    if let Some(path) = &config.storage.seed_file {
        Seed::load(path)
            .with_context(|| format!("failed to read seed file {}", path.display()))?
            .apply_if_empty(&rule_repo, &mod_repo, &settings_repo, &policy)
            .await
            .context("failed to store seed data")?;
    }

    // Event bus
    let event_bus = InProcessEventBus::new(EVENT_BUS_CAPACITY);
    tokio::spawn(record_events(
        event_bus.subscribe(),
        Arc::clone(&event_store),
    ));

    // Services
    let rule_service = RuleService::new(Arc::clone(&rule_repo), policy);
    let mod_service = ModService::new(Arc::clone(&mod_repo), event_bus.clone());
    let settings_service = SettingsService::new(Arc::clone(&settings_repo));
    let engine = Arc::new(
        RuleEngine::new(rule_repo, mod_repo, settings_repo, event_bus.clone())
            .with_custom_predicate(config.custom_predicate()),
    );

    // Engine loop
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let options = config.engine_options();
    let engine_task = tokio::spawn({
        let engine = Arc::clone(&engine);
        let snapshots = Arc::clone(&snapshot_store);
        async move {
            engine
                .run(&snapshots, options, async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await;
        }
    });
    tracing::info!(
        scan_interval = ?options.scan_interval,
        max_snapshot_age = ?options.max_snapshot_age,
        "rule engine started"
    );

    // HTTP
    let state = AppState::from_arcs(
        Arc::new(rule_service),
        Arc::new(mod_service),
        Arc::new(settings_service),
        engine,
        event_store,
        snapshot_store,
        event_bus,
    );
    let app = modhub_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("modhubd listening on http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutting down");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    engine_task.await.context("rule engine task panicked")?;
    Ok(())
}
