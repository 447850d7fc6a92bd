//! # Care Cache Core
//!
//! Runtime-free logic for the care cache: input fingerprinting, locale
//! resolution, closed vocabularies, canonical record schemas, the schema
//! normalizer, translation merging, storage-key layout, and the durable
//! store trait.
//!
//! This crate contains no tokio, sqlx, HTTP client, or filesystem I/O.
//! Everything here is a pure function of its inputs, except the
//! [`store::memory::InMemoryStore`], which holds its entries in a map.

pub mod error;
pub mod fingerprint;
pub mod locale;
pub mod models;
pub mod normalize;
pub mod response;
pub mod store;
pub mod translate;
pub mod vocab;

pub use error::{CareError, Result};
pub use fingerprint::{Fingerprint, Input};
pub use models::{CanonicalRecord, RecordKind};
