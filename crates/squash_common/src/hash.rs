//! Content hashing for cache keys and artifact integrity checks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 128-bit content hash computed using XXH3.
///
/// Two buffers with the same `ContentHash` are assumed to have identical
/// content. Used as a cache-key component for asset bytes, to derive on-disk
/// locations from cache identities, and as the checksum of stored artifacts.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes a content hash from a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Returns the raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// The first two hex digits, used to spread stored records over
    /// subdirectories.
    pub fn shard(&self) -> String {
        format!("{:02x}", self.0[0])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn same_asset_same_hash() {
        assert_eq!(ContentHash::from_bytes(PNG), ContentHash::from_bytes(&PNG.to_vec()));
    }

    #[test]
    fn one_byte_edit_changes_hash() {
        let mut edited = PNG.to_vec();
        edited[12] ^= 1;
        assert_ne!(ContentHash::from_bytes(PNG), ContentHash::from_bytes(&edited));
    }

    #[test]
    fn display_matches_bytes() {
        let h = ContentHash::from_bytes(PNG);
        let hex: String = h.as_bytes().iter().map(|b| format!("{b:02x}")).collect();
        assert_eq!(h.to_string(), hex);
        assert_eq!(hex.len(), 32);
    }

    #[test]
    fn shard_is_display_prefix() {
        let h = ContentHash::from_bytes(b"l1[s8:logo.png]");
        assert_eq!(h.shard(), h.to_string()[..2]);
    }

    #[test]
    fn empty_asset_has_a_hash() {
        let empty = ContentHash::from_bytes(b"");
        assert_ne!(empty, ContentHash::from_bytes(PNG));
    }

    #[test]
    fn debug_shows_prefix_only() {
        let h = ContentHash::from_bytes(PNG);
        let debug = format!("{h:?}");
        assert_eq!(debug, format!("ContentHash({}..)", &h.to_string()[..4]));
    }

    #[test]
    fn json_roundtrip_keeps_identity() {
        let h = ContentHash::from_bytes(PNG);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(serde_json::from_str::<ContentHash>(&json).unwrap(), h);
    }
}
