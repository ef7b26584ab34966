//! Incremental build cache.
//!
//! One cache exists per build target. It records, for every compiled source,
//! the paths it depended on and the time it was read, and answers whether a
//! source or anything it transitively depends on changed since the last
//! successful build. The variants differ only in their
//! [`InvalidationPolicy`].

#![warn(missing_docs)]

pub mod cache;
pub mod entry;
pub mod error;
pub mod freshness;
pub mod keys;
pub mod manifest;
pub mod policy;

pub use cache::{Cache, DiscardReason, LoadOptions, LoadOutcome};
pub use entry::CacheEntry;
pub use error::CacheError;
pub use keys::GlobalKeys;
pub use manifest::{cache_file_path, CacheManifest, FORMAT_VERSION};
pub use policy::{AssociatedPolicy, EntryPointPolicy, InvalidationPolicy, PlainPolicy};
