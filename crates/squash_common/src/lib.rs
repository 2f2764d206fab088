//! Shared foundational types used across the squash asset minimizer.
//!
//! This crate provides content hashing for cache keys and artifact integrity
//! checks, plus the filename-extension helpers used when a transformation
//! changes an asset's format.

#![warn(missing_docs)]

pub mod filename;
pub mod hash;

pub use filename::{extension, replace_extension};
pub use hash::ContentHash;
