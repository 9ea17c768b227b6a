//! # modhub-domain
//!
//! Pure domain model for the modhub mod-management system.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Mods** (named, toggleable behavior profiles)
//! - Define **Settings** (key → value pairs adjusted by automations)
//! - Define **System Snapshots** (observed processes, time, idle duration, state flags)
//! - Define **Rules** (condition → action automations) and their evaluation:
//!   condition evaluator, rule matcher, validation, dispatch planning
//! - Define **Events** (records of what the engine and services did)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod event;
pub mod mods;
pub mod rule;
pub mod setting;
pub mod snapshot;
