//! Serialized form of a cached payload.

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// The body written to durable storage for one cache entry.
///
/// `cache_ident` repeats the identity the record was stored under, so a
/// record reached through a colliding store key is recognized as a miss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Output filename.
    pub filename: String,
    /// Raw transformed bytes.
    pub compressed: Vec<u8>,
    /// Warnings produced while transforming.
    pub warnings: Vec<String>,
    /// The cache identity this record belongs to.
    pub cache_ident: String,
}

impl CacheRecord {
    /// Encodes the record with bincode.
    pub fn encode(&self) -> Result<Vec<u8>, CacheError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard()).map_err(|e| {
            CacheError::Serialization {
                reason: e.to_string(),
            }
        })
    }

    /// Decodes a record previously produced by [`CacheRecord::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, CacheError> {
        let (record, read): (Self, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard()).map_err(
                |e| CacheError::Serialization {
                    reason: e.to_string(),
                },
            )?;
        if read != bytes.len() {
            return Err(CacheError::Serialization {
                reason: format!("{} trailing bytes after record", bytes.len() - read),
            });
        }
        Ok(record)
    }
}
