//! Content-addressed result cache with self-healing reads.
//!
//! Expensive fetch-and-parse operations are wrapped with
//! [`ResultCache::get_or_compute`]. Entries live in one directory, one file
//! per [`CacheKey`]; an entry that fails validation or decoding is deleted and
//! recomputed instead of surfacing an error.

#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod key;
pub mod store;

pub use cache::{default_root, CacheValue, ResultCache};
pub use error::CacheError;
pub use key::{CacheKey, CallOptions, CallSignature, CONTROL_FLAGS};
pub use store::{EntryStore, ENTRY_EXT};
