//! Persistent, content-addressed cache for transformation results.
//!
//! An [`ArtifactCache`] fronts a [`DurableStore`] (normally the on-disk
//! [`DiskStore`]) with an [`IdentityCache`] keyed by the address of the input
//! buffer. Durable entries are addressed by the identity of a [`CacheKey`],
//! a canonical encoding of the ordered key parts supplied by the caller.
//! Reads are fail-safe: any problem with a stored entry is a cache miss.

#![warn(missing_docs)]

pub mod cache;
pub mod convention;
pub mod entry;
pub mod error;
pub mod key;
pub mod location;
pub mod memory;
pub mod record;
pub mod store;

pub use cache::ArtifactCache;
pub use convention::{PayloadConvention, RawBytes, RawSource, SourceObject};
pub use entry::{CacheEntry, Payload};
pub use error::CacheError;
pub use key::{CacheKey, KeyPart};
pub use location::{default_cache_dir, CacheLocation, CACHE_NAME};
pub use memory::IdentityCache;
pub use store::{DiskStore, DurableStore};
