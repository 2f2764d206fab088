//! Cache keys and their canonical identity encoding.
//!
//! A [`CacheKey`] is an ordered list of [`KeyPart`]s. Its identity is a
//! type-tagged, length-prefixed text encoding of those parts, so equal part
//! lists always produce byte-identical identities while lists that differ in
//! order, value, or type (`1` versus `"1"`) never do.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::OnceLock;

use squash_common::ContentHash;

/// One component of a cache key.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyPart {
    /// An explicit absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating-point number, compared and encoded by its bit pattern.
    Float(f64),
    /// A string.
    Str(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// An ordered list.
    List(Vec<KeyPart>),
    /// A map with sorted string keys.
    Map(BTreeMap<String, KeyPart>),
}

impl KeyPart {
    fn encode(&self, out: &mut String) {
        // Writing to a String cannot fail.
        let _ = match self {
            KeyPart::Null => write!(out, "n"),
            KeyPart::Bool(b) => write!(out, "b{}", u8::from(*b)),
            KeyPart::Int(i) => write!(out, "i{i};"),
            KeyPart::Float(f) => write!(out, "f{:016x};", f.to_bits()),
            KeyPart::Str(s) => write!(out, "s{}:{s}", s.len()),
            KeyPart::Bytes(bytes) => {
                let _ = write!(out, "x{}:", bytes.len());
                for byte in bytes {
                    let _ = write!(out, "{byte:02x}");
                }
                Ok(())
            }
            KeyPart::List(items) => {
                let _ = write!(out, "l{}[", items.len());
                for item in items {
                    item.encode(out);
                }
                write!(out, "]")
            }
            KeyPart::Map(map) => {
                let _ = write!(out, "m{}{{", map.len());
                for (key, value) in map {
                    let _ = write!(out, "s{}:{key}", key.len());
                    value.encode(out);
                }
                write!(out, "}}")
            }
        };
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        KeyPart::Bool(value)
    }
}

impl From<i32> for KeyPart {
    fn from(value: i32) -> Self {
        KeyPart::Int(value.into())
    }
}

impl From<u32> for KeyPart {
    fn from(value: u32) -> Self {
        KeyPart::Int(value.into())
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        KeyPart::Int(value)
    }
}

impl From<f64> for KeyPart {
    fn from(value: f64) -> Self {
        KeyPart::Float(value)
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::Str(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::Str(value)
    }
}

impl From<Vec<u8>> for KeyPart {
    fn from(value: Vec<u8>) -> Self {
        KeyPart::Bytes(value)
    }
}

impl From<ContentHash> for KeyPart {
    fn from(value: ContentHash) -> Self {
        KeyPart::Str(value.to_string())
    }
}

impl<T: Into<KeyPart>> From<Option<T>> for KeyPart {
    fn from(value: Option<T>) -> Self {
        value.map_or(KeyPart::Null, Into::into)
    }
}

impl From<Vec<String>> for KeyPart {
    fn from(value: Vec<String>) -> Self {
        KeyPart::List(value.into_iter().map(KeyPart::Str).collect())
    }
}

impl From<Vec<KeyPart>> for KeyPart {
    fn from(value: Vec<KeyPart>) -> Self {
        KeyPart::List(value)
    }
}

/// An ordered, immutable list of key parts with a lazily computed identity.
#[derive(Debug, Clone, Default)]
pub struct CacheKey {
    parts: Vec<KeyPart>,
    identity: OnceLock<String>,
}

impl CacheKey {
    /// Creates a key from its parts.
    pub fn new(parts: Vec<KeyPart>) -> Self {
        Self {
            parts,
            identity: OnceLock::new(),
        }
    }

    /// Returns the key parts in order.
    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    /// Returns the canonical identity, computing it on first use.
    pub fn identity(&self) -> &str {
        self.identity.get_or_init(|| {
            let mut out = String::new();
            let _ = write!(out, "l{}[", self.parts.len());
            for part in &self.parts {
                part.encode(&mut out);
            }
            out.push(']');
            out
        })
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl FromIterator<KeyPart> for CacheKey {
    fn from_iter<I: IntoIterator<Item = KeyPart>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
