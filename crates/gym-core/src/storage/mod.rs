//! Storage layer for GYM.
//!
//! Triples are stored vertically partitioned in sled: one tree per
//! predicate, holding the `(subject, object)` pairs of that predicate.

mod config;
mod loader;
mod store;

pub use config::StorageConfig;
pub use loader::{LoadReport, Loader};
pub use store::{VpRow, VpStore};
