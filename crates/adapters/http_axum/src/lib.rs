//! # modhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON API** for rules, mods, settings and the event log
//!   (`/api/rules`, `/api/mods`, `/api/settings`, `/api/events`, …)
//! - Accept system snapshots from the host (`PUT /api/system/snapshot`)
//!   and dry-run rules against a snapshot (`POST /api/evaluate`)
//! - Stream domain events live over SSE (`/api/events/stream`)
//!
//! ## Dependency rule
//! Depends on `modhub-app` (for port traits, services and the engine) and
//! `modhub-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
