//! # modhub-adapter-memory
//!
//! In-memory persistence adapter.
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `modhub-app::ports`
//! - Keep a bounded, newest-first event log
//! - Hold the latest reported system snapshot
//! - Load rules, mods and settings from a JSON seed file
//!
//! ## Dependency rule
//! Depends on `modhub-app` (for port traits) and `modhub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod event_store;
pub mod mod_repo;
pub mod rule_repo;
pub mod seed;
pub mod settings_repo;
pub mod snapshot_store;

pub use error::StorageError;
pub use event_store::MemoryEventStore;
pub use mod_repo::MemoryModRepository;
pub use rule_repo::MemoryRuleRepository;
pub use seed::{Seed, SeedReport};
pub use settings_repo::MemorySettingsRepository;
pub use snapshot_store::MemorySnapshotStore;
