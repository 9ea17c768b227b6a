//! # modhub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `RuleRepository` — CRUD for rules
//!   - `ModRepository` — CRUD for mods, target resolution
//!   - `SettingsRepository` — key → value settings
//!   - `SnapshotStore` — latest observed system state
//!   - `EventStore` — append & query events
//!   - `EventPublisher` — publish events
//! - Define **driving/inbound ports** as use-case structs:
//!   - `RuleService` — validate, save, list, patch, delete rules
//!   - `ModService` — register, toggle, list mods
//!   - `SettingsService` — read and write settings
//!   - `RuleEngine` — evaluate rules against snapshots and dispatch actions
//! - Provide **in-process infrastructure** (event bus, event recorder) that
//!   doesn't need IO
//!
//! ## Dependency rule
//! Depends on `modhub-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod ports;
pub mod rule_engine;
pub mod services;

#[cfg(test)]
mod fakes;
