//! pkgarchive - package archive indexing and snapshot publishing
//!
//! This library scans a package store, extracts each package's metadata,
//! merges it into an index holding the newest version of every package, and
//! persists that index as immutable, time-ordered `archive-contents`
//! snapshots that clients download.
//!
//! The pieces, leaves first:
//!
//! - [`package`]: versions, descriptors and the store naming scheme
//! - [`scanner`]: finds candidate package files in the store
//! - [`extract`]: turns a candidate into a descriptor
//! - [`archive`]: the index, its merge rule and the contents format
//! - [`snapshot`]: writes snapshots and resolves the newest one
//! - [`service`]: publish, purge and rebuild under one lock

pub mod archive;
pub mod config;
pub mod extract;
pub mod logging;
pub mod package;
pub mod scanner;
pub mod service;
pub mod sexp;
pub mod snapshot;

/// Version of the pkgarchive library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
