//! Durable key/value storage for cache records.
//!
//! [`DiskStore`] keeps one file per key at
//! `<root>/content/<xx>/<hash>.bin`, where `<hash>` is the content hash of
//! the key and `<xx>` its first two hex digits. Each file carries a header
//! with magic bytes, a format version, and a checksum of the payload.
//! Writes go to a temporary file that is renamed into place, so a reader
//! never observes a partially written record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use squash_common::ContentHash;

use crate::error::CacheError;

/// Magic bytes identifying a squash cache artifact.
const ARTIFACT_MAGIC: [u8; 4] = *b"SQSH";

/// Current artifact format version. Increment on breaking changes to
/// the header or payload format.
const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Subdirectory holding all artifacts.
const CONTENT_SUBDIR: &str = "content";

/// File extension for artifacts.
const ARTIFACT_EXT: &str = "bin";

/// Distinguishes temporary files of concurrent writers within one process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A byte store addressed by opaque string keys.
///
/// Implementations must be safe to share between threads; writes to
/// different keys must never interfere.
pub trait DurableStore: Send + Sync {
    /// Writes `data` under `key`, replacing any previous value.
    fn put(&self, key: &str, data: &[u8]) -> Result<(), CacheError>;

    /// Reads the value stored under `key`. A missing key is `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Removes the value stored under `key`. Returns `true` if one existed.
    fn remove(&self, key: &str) -> Result<bool, CacheError>;

    /// Removes every stored value and returns how many were removed.
    fn clear(&self) -> Result<usize, CacheError>;
}

/// Header prepended to every stored artifact for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ArtifactHeader {
    /// Magic bytes: must be `b"SQSH"`.
    magic: [u8; 4],
    /// Artifact format version.
    format_version: u32,
    /// Content hash of the payload data.
    checksum: ContentHash,
}

/// Filesystem-backed [`DurableStore`].
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Creates a store rooted at `root`. Directories are created lazily.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// The root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the file path used for `key`.
    pub fn artifact_path(&self, key: &str) -> PathBuf {
        let hash = ContentHash::from_bytes(key.as_bytes());
        self.root
            .join(CONTENT_SUBDIR)
            .join(hash.shard())
            .join(format!("{hash}.{ARTIFACT_EXT}"))
    }

    fn encode(data: &[u8]) -> Result<Vec<u8>, CacheError> {
        let header = ArtifactHeader {
            magic: ARTIFACT_MAGIC,
            format_version: ARTIFACT_FORMAT_VERSION,
            checksum: ContentHash::from_bytes(data),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        // 4-byte header length (little-endian) + header + payload
        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + data.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(data);
        Ok(output)
    }

    fn decode(path: &Path, raw: &[u8]) -> Result<Vec<u8>, CacheError> {
        let invalid = |reason: &str| CacheError::InvalidHeader {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let len_bytes: [u8; 4] = raw
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| invalid("truncated header length"))?;
        let header_len = u32::from_le_bytes(len_bytes) as usize;
        let header_end = 4usize
            .checked_add(header_len)
            .filter(|end| *end <= raw.len())
            .ok_or_else(|| invalid("truncated header"))?;

        let (header, _): (ArtifactHeader, usize) =
            bincode::serde::decode_from_slice(&raw[4..header_end], bincode::config::standard())
                .map_err(|e| invalid(&e.to_string()))?;

        if header.magic != ARTIFACT_MAGIC {
            return Err(invalid("bad magic bytes"));
        }
        if header.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(CacheError::VersionMismatch {
                path: path.to_path_buf(),
                expected: ARTIFACT_FORMAT_VERSION,
                actual: header.format_version,
            });
        }

        let payload = &raw[header_end..];
        let actual = ContentHash::from_bytes(payload);
        if actual != header.checksum {
            return Err(CacheError::ChecksumMismatch {
                path: path.to_path_buf(),
                expected: header.checksum.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(payload.to_vec())
    }

    fn temp_path(final_path: &Path) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut name = final_path.as_os_str().to_os_string();
        name.push(format!(".tmp-{}-{n}", std::process::id()));
        PathBuf::from(name)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CacheError + '_ {
    move |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl DurableStore for DiskStore {
    fn put(&self, key: &str, data: &[u8]) -> Result<(), CacheError> {
        let final_path = self.artifact_path(key);
        if let Some(dir) = final_path.parent() {
            std::fs::create_dir_all(dir).map_err(io_error(dir))?;
        }

        let output = Self::encode(data)?;
        let temp_path = Self::temp_path(&final_path);
        std::fs::write(&temp_path, &output).map_err(io_error(&temp_path))?;

        // rename replaces an existing record atomically.
        std::fs::rename(&temp_path, &final_path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            io_error(&final_path)(e)
        })
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.artifact_path(key);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path)(e)),
        };
        Self::decode(&path, &raw).map(Some)
    }

    fn remove(&self, key: &str) -> Result<bool, CacheError> {
        let path = self.artifact_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(&path)(e)),
        }
    }

    fn clear(&self) -> Result<usize, CacheError> {
        let content = self.root.join(CONTENT_SUBDIR);
        if !content.exists() {
            return Ok(0);
        }

        let mut removed = 0;
        for shard in std::fs::read_dir(&content).map_err(io_error(&content))? {
            let shard = shard.map_err(io_error(&content))?.path();
            if !shard.is_dir() {
                continue;
            }
            for entry in std::fs::read_dir(&shard).map_err(io_error(&shard))? {
                let path = entry.map_err(io_error(&shard))?.path();
                if path.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXT) {
                    removed += 1;
                }
            }
        }
        std::fs::remove_dir_all(&content).map_err(io_error(&content))?;
        Ok(removed)
    }
}
