//! Error types for cache operations.

use std::path::PathBuf;

/// Failures of the on-disk entry store.
///
/// [`ResultCache`](crate::ResultCache) never returns these to its callers:
/// corrupt entries are recomputed and write failures are logged. They surface
/// directly only from [`EntryStore`](crate::EntryStore) and [`default_root`](crate::default_root).
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Reading, writing, renaming or deleting an entry failed.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// The OS error.
        source: std::io::Error,
    },

    /// The entry is truncated or does not start with a valid header.
    #[error("invalid entry header in {path}: {reason}")]
    InvalidHeader {
        /// Entry file.
        path: PathBuf,
        /// What is wrong with the header.
        reason: String,
    },

    /// The payload was modified after the header was written.
    #[error("checksum mismatch in {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Entry file.
        path: PathBuf,
        /// Checksum recorded in the header.
        expected: String,
        /// Checksum of the payload as found.
        actual: String,
    },

    /// The entry was written by an incompatible format version.
    #[error("version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Entry file.
        path: PathBuf,
        /// Version this build writes.
        expected: u32,
        /// Version found in the entry.
        actual: u32,
    },

    /// Encoding a value or decoding a payload failed.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Message from the codec.
        reason: String,
    },

    /// Neither `HOME` nor `USERPROFILE` is set, so no default root exists.
    #[error("could not determine the home directory for the default cache root")]
    MissingHomeDir,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = CacheError::Io {
            path: PathBuf::from("/tmp/cache/abcd.bin"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("cache I/O error"));
        assert!(msg.contains("abcd.bin"));
    }

    #[test]
    fn invalid_header_display() {
        let err = CacheError::InvalidHeader {
            path: PathBuf::from("bad.bin"),
            reason: "missing magic bytes".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("invalid entry header"));
        assert!(msg.contains("missing magic bytes"));
    }

    #[test]
    fn checksum_mismatch_display() {
        let err = CacheError::ChecksumMismatch {
            path: PathBuf::from("file.bin"),
            expected: "aabb".to_string(),
            actual: "ccdd".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("checksum mismatch"));
        assert!(msg.contains("aabb"));
        assert!(msg.contains("ccdd"));
    }

    #[test]
    fn version_mismatch_display() {
        let err = CacheError::VersionMismatch {
            path: PathBuf::from("old.bin"),
            expected: 2,
            actual: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("expected 2"));
        assert!(msg.contains("got 1"));
    }

    #[test]
    fn missing_home_display() {
        assert!(CacheError::MissingHomeDir.to_string().contains("home directory"));
    }
}
