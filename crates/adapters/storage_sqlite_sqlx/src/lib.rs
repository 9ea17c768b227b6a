//! # modhub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the rule, mod, settings and event port traits defined in
//!   `modhub-app::ports`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `modhub-app` (for port traits) and `modhub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod codec;
pub mod error;
pub mod event_store;
pub mod mod_repo;
pub mod pool;
pub mod rule_repo;
pub mod settings_repo;

pub use error::StorageError;
pub use event_store::SqliteEventStore;
pub use mod_repo::SqliteModRepository;
pub use pool::{Config, Database};
pub use rule_repo::SqliteRuleRepository;
pub use settings_repo::SqliteSettingsRepository;
