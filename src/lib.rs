//! # Care Cache
//!
//! Canonical result cache and translation memoization for laundry-care
//! answers produced by a remote vision/language model.
//!
//! Model replies are slow, costly and loosely formatted. Care Cache turns
//! each reply into a strict canonical record, stores it under a content
//! fingerprint of the input so identical inputs never reach the model
//! twice, and memoizes per-locale translations of every record separately.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌───────────────┐   ┌──────────────┐
//! │ Fingerprint │──▶│ Canonicalizer │──▶│ Versioned    │
//! │ image/text  │   │ single-flight │   │ cache        │
//! └─────────────┘   └───────┬───────┘   │ local+SQLite │
//!                           ▼           └──────▲───────┘
//!                   ┌───────────────┐          │
//!                   │ Translation   │──────────┘
//!                   │ memoizer      │
//!                   └───────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! carecache init
//! carecache analyze garment --image shirt.jpg --locale de
//! carecache analyze laundry --text "Can I wash wool at 40?" --locale el
//! carecache stats
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite durable tier |
//! | [`cache`] | Two-tier versioned cache |
//! | [`single_flight`] | Concurrent request deduplication |
//! | [`transport`] | Model transport abstraction |
//! | [`prompts`] | Prompt text |
//! | [`canonical`] | Canonicalization orchestrator |
//! | [`translate`] | Translation memoizer |
//! | [`engine`] | End-to-end facade |
//! | [`analyze`] | `fingerprint` / `analyze` commands |
//! | [`stats`] | `stats` command |
//! | [`logging`] | Subscriber setup for the binary |
//!
//! Pure logic (fingerprints, vocabularies, record types, the normalizer)
//! lives in the `care-cache-core` crate.

pub mod analyze;
pub mod cache;
pub mod canonical;
pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod migrate;
pub mod prompts;
pub mod single_flight;
pub mod sqlite_store;
pub mod stats;
pub mod translate;
pub mod transport;

pub use engine::{Analysis, CareEngine};
