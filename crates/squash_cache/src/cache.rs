//! High-level cache orchestrator.
//!
//! [`ArtifactCache`] answers `get` from the identity cache when the payload
//! convention allows it, then from durable storage. It never reports read
//! problems: a corrupt, foreign, or unreadable record is a miss. Write
//! problems are returned so callers can decide whether they are fatal.

use std::marker::PhantomData;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::convention::PayloadConvention;
use crate::entry::{CacheEntry, Payload};
use crate::error::CacheError;
use crate::location::CacheLocation;
use crate::memory::IdentityCache;
use crate::record::CacheRecord;
use crate::store::{DiskStore, DurableStore};

/// Content-addressed cache of transformation payloads.
///
/// `C` selects how compressed bytes are represented for the caller, see
/// [`PayloadConvention`].
pub struct ArtifactCache<C: PayloadConvention> {
    /// Durable backend; `None` when caching is disabled.
    store: Option<Arc<dyn DurableStore>>,

    /// Payloads keyed by input buffer identity.
    identity: Arc<IdentityCache<Payload<C::Compressed>>>,

    convention: PhantomData<fn() -> C>,
}

impl<C: PayloadConvention> ArtifactCache<C> {
    /// Creates a cache for the given location, backed by a [`DiskStore`].
    pub fn new(location: &CacheLocation) -> Self {
        let store = location.resolve().map(|dir| {
            debug!(dir = %dir.display(), "using durable cache directory");
            Arc::new(DiskStore::new(&dir)) as Arc<dyn DurableStore>
        });
        Self::with_store(store)
    }

    /// Creates a disk-backed cache rooted at `dir`.
    pub fn at(dir: &Path) -> Self {
        Self::with_store(Some(Arc::new(DiskStore::new(dir))))
    }

    /// Creates a cache over an arbitrary durable store, or a disabled cache
    /// when `store` is `None`.
    pub fn with_store(store: Option<Arc<dyn DurableStore>>) -> Self {
        Self {
            store,
            identity: Arc::new(IdentityCache::new()),
            convention: PhantomData,
        }
    }

    /// Replaces the identity cache, e.g. to share one between caches.
    pub fn with_identity_cache(
        mut self,
        identity: Arc<IdentityCache<Payload<C::Compressed>>>,
    ) -> Self {
        self.identity = identity;
        self
    }

    /// The identity cache used by this instance.
    pub fn identity_cache(&self) -> &Arc<IdentityCache<Payload<C::Compressed>>> {
        &self.identity
    }

    /// Returns `true` if durable caching is enabled.
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Looks up the payload for `entry`.
    ///
    /// Returns `None` when caching is disabled, on a miss, and whenever the
    /// stored record cannot be read.
    pub fn get(&self, entry: &CacheEntry<C::Compressed>) -> Option<Payload<C::Compressed>> {
        let store = self.store.as_ref()?;

        if C::IDENTITY_FAST_PATH {
            if let Some(payload) = self.identity.get(entry.source()) {
                debug!(filename = %payload.filename, "identity cache hit");
                return Some(payload);
            }
        }

        let identity = entry.identity();
        let bytes = match store.get(identity) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(identity, "cache miss");
                return None;
            }
            Err(e) => {
                debug!(identity, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        let record = match CacheRecord::decode(&bytes) {
            Ok(record) => record,
            Err(e) => {
                debug!(identity, error = %e, "undecodable cache record, treating as miss");
                return None;
            }
        };
        if record.cache_ident != identity {
            debug!(identity, stored = %record.cache_ident, "cache identity mismatch");
            return None;
        }

        debug!(identity, filename = %record.filename, "cache hit");
        Some(Payload {
            filename: record.filename,
            compressed: C::wrap(record.compressed),
            warnings: record.warnings,
        })
    }

    /// Stores the payload attached to `entry`.
    ///
    /// The identity cache is populated first, even when durable caching is
    /// disabled. Durable write failures are returned.
    pub fn store(&self, entry: &CacheEntry<C::Compressed>) -> Result<(), CacheError> {
        let payload = entry.payload().ok_or_else(|| CacheError::MissingPayload {
            identity: entry.identity().to_string(),
        })?;

        if C::IDENTITY_FAST_PATH {
            self.identity.insert(entry.source(), payload.clone());
        }

        let Some(store) = &self.store else {
            return Ok(());
        };

        let record = CacheRecord {
            filename: payload.filename.clone(),
            compressed: C::unwrap(&payload.compressed).to_vec(),
            warnings: payload.warnings.clone(),
            cache_ident: entry.identity().to_string(),
        };
        store.put(entry.identity(), &record.encode()?)?;
        debug!(identity = entry.identity(), filename = %payload.filename, "stored cache entry");
        Ok(())
    }

    /// Removes every durable entry and empties the identity cache.
    ///
    /// Returns the number of durable entries removed.
    pub fn clear(&self) -> Result<usize, CacheError> {
        self.identity.clear();
        match &self.store {
            Some(store) => store.clear(),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parking_lot::Mutex;
    use squash_common::ContentHash;

    use crate::convention::{RawBytes, RawSource, SourceObject};
    use crate::key::{CacheKey, KeyPart};

    /// In-memory store that counts reads and writes.
    #[derive(Default)]
    struct CountingStore {
        data: Mutex<HashMap<String, Vec<u8>>>,
        gets: AtomicUsize,
        puts: AtomicUsize,
    }

    impl DurableStore for CountingStore {
        fn put(&self, key: &str, data: &[u8]) -> Result<(), CacheError> {
            self.puts.fetch_add(1, Ordering::SeqCst);
            self.data.lock().insert(key.to_string(), data.to_vec());
            Ok(())
        }

        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            Ok(self.data.lock().get(key).cloned())
        }

        fn remove(&self, key: &str) -> Result<bool, CacheError> {
            Ok(self.data.lock().remove(key).is_some())
        }

        fn clear(&self) -> Result<usize, CacheError> {
            let mut data = self.data.lock();
            let n = data.len();
            data.clear();
            Ok(n)
        }
    }

    /// Store whose every operation fails.
    struct BrokenStore;

    impl DurableStore for BrokenStore {
        fn put(&self, _key: &str, _data: &[u8]) -> Result<(), CacheError> {
            Err(CacheError::Io {
                path: "/broken".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
            })
        }

        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
            Err(CacheError::Io {
                path: "/broken".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "unreadable"),
            })
        }

        fn remove(&self, _key: &str) -> Result<bool, CacheError> {
            Ok(false)
        }

        fn clear(&self) -> Result<usize, CacheError> {
            Ok(0)
        }
    }

    fn key_for(filename: &str, bytes: &[u8]) -> CacheKey {
        CacheKey::new(vec![
            KeyPart::from("optipng"),
            KeyPart::from(filename),
            KeyPart::from(ContentHash::from_bytes(bytes)),
        ])
    }

    fn source_entry(filename: &str, bytes: &[u8]) -> CacheEntry<RawSource> {
        CacheEntry::new(Arc::from(bytes), key_for(filename, bytes))
    }

    fn source_payload(filename: &str, bytes: &[u8]) -> Payload<RawSource> {
        Payload {
            filename: filename.to_string(),
            compressed: RawSource::new(bytes.to_vec()),
            warnings: vec!["reduced bit depth".to_string()],
        }
    }

    fn counting() -> (Arc<CountingStore>, ArtifactCache<SourceObject>) {
        let store = Arc::new(CountingStore::default());
        let cache = ArtifactCache::with_store(Some(store.clone() as Arc<dyn DurableStore>));
        (store, cache)
    }

    #[test]
    fn disabled_cache_is_transparent() {
        let cache: ArtifactCache<SourceObject> = ArtifactCache::new(&CacheLocation::Disabled);
        assert!(!cache.is_enabled());

        let entry = source_entry("a.png", b"png").with_payload(source_payload("a.png", b"small"));
        cache.store(&entry).unwrap();
        assert!(cache.get(&entry).is_none());
        assert_eq!(cache.clear().unwrap(), 0);
    }

    #[test]
    fn disabled_cache_still_records_identity() {
        let cache: ArtifactCache<SourceObject> = ArtifactCache::with_store(None);
        let entry = source_entry("a.png", b"png").with_payload(source_payload("a.png", b"small"));
        cache.store(&entry).unwrap();
        assert!(cache.identity_cache().contains(entry.source()));
    }

    #[test]
    fn identity_hit_skips_durable_read() {
        let (store, cache) = counting();
        let entry = source_entry("a.png", b"png").with_payload(source_payload("a.png", b"small"));
        cache.store(&entry).unwrap();
        assert_eq!(store.puts.load(Ordering::SeqCst), 1);

        let hit = cache.get(&entry).unwrap();
        assert_eq!(hit, source_payload("a.png", b"small"));
        assert_eq!(store.gets.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn identity_hit_survives_broken_store() {
        let cache: ArtifactCache<SourceObject> =
            ArtifactCache::with_store(Some(Arc::new(BrokenStore)));
        let entry = source_entry("a.png", b"png").with_payload(source_payload("a.png", b"small"));
        assert!(cache.store(&entry).is_err());
        assert_eq!(cache.get(&entry), Some(source_payload("a.png", b"small")));
    }

    #[test]
    fn same_bytes_different_buffer_goes_to_durable_store() {
        let (store, cache) = counting();
        let first = source_entry("a.png", b"png").with_payload(source_payload("a.png", b"small"));
        cache.store(&first).unwrap();

        let second = source_entry("a.png", b"png");
        assert!(!Arc::ptr_eq(first.source(), second.source()));
        let hit = cache.get(&second).unwrap();
        assert_eq!(hit.compressed.source(), b"small");
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn durable_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let writer: ArtifactCache<SourceObject> = ArtifactCache::at(dir.path());
        let entry = source_entry("a.png", b"png").with_payload(source_payload("a.jpg", b"jpeg"));
        writer.store(&entry).unwrap();

        // A fresh instance has an empty identity cache.
        let reader: ArtifactCache<SourceObject> =
            ArtifactCache::new(&CacheLocation::Explicit(dir.path().to_path_buf()));
        let hit = reader.get(&source_entry("a.png", b"png")).unwrap();
        assert_eq!(hit, source_payload("a.jpg", b"jpeg"));
    }

    #[test]
    fn raw_bytes_convention_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let cache: ArtifactCache<RawBytes> = ArtifactCache::at(dir.path());
        let input: Arc<[u8]> = Arc::from(&b"gif"[..]);
        let entry = CacheEntry::new(input.clone(), key_for("a.gif", b"gif")).with_payload(Payload {
            filename: "a.gif".to_string(),
            compressed: b"smaller gif".to_vec(),
            warnings: Vec::new(),
        });
        cache.store(&entry).unwrap();
        assert!(cache.identity_cache().is_empty());

        let hit = cache.get(&CacheEntry::new(input, key_for("a.gif", b"gif"))).unwrap();
        assert_eq!(hit.compressed, b"smaller gif");
        assert!(hit.warnings.is_empty());
    }

    #[test]
    fn different_key_misses() {
        let (_store, cache) = counting();
        let entry = source_entry("a.png", b"png").with_payload(source_payload("a.png", b"small"));
        cache.store(&entry).unwrap();
        assert!(cache.get(&source_entry("b.png", b"png")).is_none());
    }

    #[test]
    fn corrupt_entry_is_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path());
        let cache: ArtifactCache<RawBytes> = ArtifactCache::at(dir.path());
        let input: Arc<[u8]> = Arc::from(&b"svg"[..]);
        let key = key_for("a.svg", b"svg");
        let entry = CacheEntry::new(input.clone(), key.clone()).with_payload(Payload {
            filename: "a.svg".to_string(),
            compressed: b"<svg/>".to_vec(),
            warnings: Vec::new(),
        });
        cache.store(&entry).unwrap();

        let path = store.artifact_path(key.identity());
        std::fs::write(&path, b"not a record").unwrap();
        assert!(cache.get(&CacheEntry::new(input.clone(), key.clone())).is_none());

        std::fs::remove_file(&path).unwrap();
        assert!(cache.get(&CacheEntry::new(input, key)).is_none());
    }

    #[test]
    fn read_errors_are_misses() {
        let cache: ArtifactCache<RawBytes> = ArtifactCache::with_store(Some(Arc::new(BrokenStore)));
        let entry = CacheEntry::new(Arc::from(&b"x"[..]), key_for("x.png", b"x"));
        assert!(cache.get(&entry).is_none());
    }

    #[test]
    fn undecodable_record_is_a_miss() {
        let (store, cache) = counting();
        let entry = source_entry("a.png", b"png");
        store.put(entry.identity(), b"\xff\xff").unwrap();
        assert!(cache.get(&entry).is_none());
    }

    #[test]
    fn foreign_identity_is_a_miss() {
        let (store, cache) = counting();
        let entry = source_entry("a.png", b"png");
        let record = CacheRecord {
            filename: "a.png".to_string(),
            compressed: b"other".to_vec(),
            warnings: Vec::new(),
            cache_ident: "l0[]".to_string(),
        };
        store.put(entry.identity(), &record.encode().unwrap()).unwrap();
        assert!(cache.get(&entry).is_none());
    }

    #[test]
    fn write_failure_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, b"x").unwrap();
        let cache: ArtifactCache<RawBytes> = ArtifactCache::at(&file);
        let entry = CacheEntry::new(Arc::from(&b"x"[..]), key_for("x.png", b"x")).with_payload(
            Payload {
                filename: "x.png".to_string(),
                compressed: b"y".to_vec(),
                warnings: Vec::new(),
            },
        );
        assert!(matches!(cache.store(&entry), Err(CacheError::Io { .. })));
    }

    #[test]
    fn store_without_payload_errors() {
        let (_store, cache) = counting();
        let entry = source_entry("a.png", b"png");
        assert!(matches!(
            cache.store(&entry),
            Err(CacheError::MissingPayload { .. })
        ));
    }

    #[test]
    fn shared_identity_cache() {
        let shared = Arc::new(IdentityCache::new());
        let a: ArtifactCache<SourceObject> =
            ArtifactCache::with_store(Some(Arc::new(CountingStore::default())))
                .with_identity_cache(shared.clone());
        let b: ArtifactCache<SourceObject> =
            ArtifactCache::with_store(Some(Arc::new(CountingStore::default())))
                .with_identity_cache(shared);
        let entry = source_entry("a.png", b"png").with_payload(source_payload("a.png", b"small"));
        a.store(&entry).unwrap();
        assert!(b.get(&entry).is_some());
    }

    #[test]
    fn concurrent_store_and_get_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let cache: ArtifactCache<SourceObject> = ArtifactCache::at(dir.path());
        std::thread::scope(|scope| {
            for i in 0..16u32 {
                let cache = &cache;
                scope.spawn(move || {
                    let name = format!("asset-{i}.png");
                    let bytes = i.to_le_bytes();
                    let entry = source_entry(&name, &bytes)
                        .with_payload(source_payload(&name, &bytes));
                    cache.store(&entry).unwrap();
                });
            }
        });

        let reader: ArtifactCache<SourceObject> = ArtifactCache::at(dir.path());
        for i in 0..16u32 {
            let name = format!("asset-{i}.png");
            let bytes = i.to_le_bytes();
            let hit = reader.get(&source_entry(&name, &bytes)).unwrap();
            assert_eq!(hit.compressed.source(), &bytes);
        }
    }

    #[test]
    fn clear_removes_durable_and_identity_entries() {
        let (_store, cache) = counting();
        let entry = source_entry("a.png", b"png").with_payload(source_payload("a.png", b"small"));
        cache.store(&entry).unwrap();
        assert_eq!(cache.clear().unwrap(), 1);
        assert!(cache.get(&entry).is_none());
    }
}
