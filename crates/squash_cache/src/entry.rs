//! Cache entries and the payloads they carry.

use std::sync::Arc;

use crate::key::CacheKey;

/// A cached transformation result.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload<T> {
    /// The output filename, which may differ from the input's extension.
    pub filename: String,
    /// The transformed bytes, in the convention's representation.
    pub compressed: T,
    /// Warnings produced while transforming.
    pub warnings: Vec<String>,
}

/// Identity of one cached transformation result.
///
/// Holds the input buffer (its allocation is the key of the identity
/// cache), the durable [`CacheKey`], and, once computed, the payload to
/// store.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    source: Arc<[u8]>,
    key: CacheKey,
    payload: Option<Payload<T>>,
}

impl<T> CacheEntry<T> {
    /// Creates an entry for `source` identified durably by `key`.
    pub fn new(source: Arc<[u8]>, key: CacheKey) -> Self {
        Self {
            source,
            key,
            payload: None,
        }
    }

    /// Attaches the payload to be stored.
    pub fn with_payload(mut self, payload: Payload<T>) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Replaces the payload to be stored.
    pub fn set_payload(&mut self, payload: Payload<T>) {
        self.payload = Some(payload);
    }

    /// The input buffer this entry was created for.
    pub fn source(&self) -> &Arc<[u8]> {
        &self.source
    }

    /// The durable cache key.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Shorthand for `self.key().identity()`.
    pub fn identity(&self) -> &str {
        self.key.identity()
    }

    /// The payload, if one has been attached.
    pub fn payload(&self) -> Option<&Payload<T>> {
        self.payload.as_ref()
    }

    /// Removes and returns the payload.
    pub fn take_payload(&mut self) -> Option<Payload<T>> {
        self.payload.take()
    }
}
