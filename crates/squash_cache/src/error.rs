//! Cache failures.

use std::path::PathBuf;

/// Everything that can go wrong while reading or writing cached results.
///
/// Reads are fail-safe: read-side errors are logged and turned into cache
/// misses by [`ArtifactCache::get`](crate::ArtifactCache::get). Write-side
/// errors are returned to the caller of
/// [`ArtifactCache::store`](crate::ArtifactCache::store).
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Filesystem access to a record or its directory failed.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Cause reported by the OS.
        source: std::io::Error,
    },

    /// The record file does not start with a readable `SQSH` header.
    #[error("invalid artifact header in {path}: {reason}")]
    InvalidHeader {
        /// Record file.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// The record body was truncated or altered after it was written.
    #[error("checksum mismatch in {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Record file.
        path: PathBuf,
        /// Hash recorded in the header.
        expected: String,
        /// Hash of the body as read.
        actual: String,
    },

    /// The record was written by an incompatible release.
    #[error("version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Record file.
        path: PathBuf,
        /// Format this build reads.
        expected: u32,
        /// Format found on disk.
        actual: u32,
    },

    /// bincode could not encode or decode a record.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Message from bincode.
        reason: String,
    },

    /// `store` was called with an entry that carries no payload.
    #[error("cache entry {identity} has no payload to store")]
    MissingPayload {
        /// Identity of the offending entry.
        identity: String,
    },
}
