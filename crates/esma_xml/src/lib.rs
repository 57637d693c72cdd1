//! Flattening of namespace-qualified disclosure documents into flat records.
//!
//! The pipeline is: parse ([`parse_document`]) → strip namespaces
//! ([`normalize_namespaces`]) → flatten each repeating block with a
//! [`Flattener`] → collect the records ([`assemble`]). Everything here is
//! pure and deterministic; flattening the same tree twice yields the same
//! records.

#![warn(missing_docs)]

pub mod assemble;
pub mod element;
pub mod error;
pub mod flatten;
pub mod listing;
pub mod namespace;

pub use assemble::{
    read_document, read_positional, read_transparency_blocks, Layout, NoProgress, Progress,
    BLOCK_TAGS,
};
pub use element::{parse_document, Element};
pub use error::XmlError;
pub use flatten::{
    flatten_counting, flatten_recursive, CounterPool, Flattener, Strategy, SUB_CLASSIFICATION_TAG,
};
pub use listing::read_listing;
pub use namespace::{local_name, normalize_namespaces, strip_namespace, RESERVED_TAGS};
