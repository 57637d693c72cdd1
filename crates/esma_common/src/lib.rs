//! Shared foundational types used across the disclosure loader.
//!
//! This crate provides content hashing, flat key-value records produced by the
//! XML flatteners, and the column-oriented [`Table`] those records are
//! assembled into.

#![warn(missing_docs)]

pub mod hash;
pub mod record;
pub mod table;

pub use hash::ContentHash;
pub use record::{FlatRecord, RecordSet};
pub use table::{Row, Table, TableShapeError, INDEX_ARTIFACT_COLUMN};
