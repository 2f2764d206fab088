//! Payload conventions: how compressed bytes are represented at the boundary.
//!
//! Two kinds of callers use the cache. Loader-style callers hand over plain
//! byte vectors; compilation-style callers work with [`RawSource`] objects and
//! also benefit from the identity fast path. The convention is a type
//! parameter of [`ArtifactCache`](crate::ArtifactCache), so the choice is
//! made once at construction.

use std::fmt;
use std::sync::Arc;

/// Strategy for wrapping and unwrapping the compressed payload.
pub trait PayloadConvention: Send + Sync + 'static {
    /// The caller-facing representation of compressed bytes.
    type Compressed: Clone + Send + Sync;

    /// Whether `get`/`store` consult the identity cache.
    const IDENTITY_FAST_PATH: bool;

    /// Turns bytes read from durable storage into the caller's representation.
    fn wrap(bytes: Vec<u8>) -> Self::Compressed;

    /// Borrows the raw bytes to be written to durable storage.
    fn unwrap(compressed: &Self::Compressed) -> &[u8];
}

/// Plain byte vectors, no identity fast path.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBytes;

impl PayloadConvention for RawBytes {
    type Compressed = Vec<u8>;
    const IDENTITY_FAST_PATH: bool = false;

    fn wrap(bytes: Vec<u8>) -> Vec<u8> {
        bytes
    }

    fn unwrap(compressed: &Vec<u8>) -> &[u8] {
        compressed
    }
}

/// [`RawSource`] objects, with the identity fast path enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceObject;

impl PayloadConvention for SourceObject {
    type Compressed = RawSource;
    const IDENTITY_FAST_PATH: bool = true;

    fn wrap(bytes: Vec<u8>) -> RawSource {
        RawSource::new(bytes)
    }

    fn unwrap(compressed: &RawSource) -> &[u8] {
        compressed.source()
    }
}

/// An immutable, cheaply cloneable asset source.
#[derive(Clone, PartialEq, Eq)]
pub struct RawSource(Arc<[u8]>);

impl RawSource {
    /// Wraps the given bytes.
    pub fn new(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    /// Returns the source bytes.
    pub fn source(&self) -> &[u8] {
        &self.0
    }

    /// Returns the size of the source in bytes.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Returns the shared buffer backing this source.
    pub fn buffer(&self) -> &Arc<[u8]> {
        &self.0
    }
}

impl fmt::Debug for RawSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawSource({} bytes)", self.0.len())
    }
}
