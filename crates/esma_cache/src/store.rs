//! On-disk entry storage.
//!
//! Each entry is one file `<root>/<key>.bin` holding a small header (magic
//! bytes, format version, payload checksum) followed by the bincode-encoded
//! value. Files are written to a temporary sibling and renamed into place, so
//! a reader sees either the previous entry or the new one.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use esma_common::ContentHash;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::key::CacheKey;

/// Magic bytes identifying a cache entry.
const ENTRY_MAGIC: [u8; 4] = *b"ESMA";

/// Current entry format version. Increment on breaking changes to the header
/// or payload encoding.
const ENTRY_FORMAT_VERSION: u32 = 1;

/// File extension of entry files.
pub const ENTRY_EXT: &str = "bin";

/// Extension of in-flight temporary files.
const TMP_EXT: &str = "tmp";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Header prepended to every entry for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryHeader {
    magic: [u8; 4],
    format_version: u32,
    checksum: ContentHash,
}

/// Directory of keyed entry files.
///
/// The root directory is created on the first write and remembered for the
/// lifetime of the store. Nothing is ever deleted automatically except
/// entries explicitly removed.
pub struct EntryStore {
    root: PathBuf,
    created: OnceLock<()>,
}

impl EntryStore {
    /// Creates a store rooted at `root`. No filesystem access happens yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            created: OnceLock::new(),
        }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the root directory if this store has not done so yet.
    pub fn ensure_root(&self) -> Result<&Path, CacheError> {
        if self.created.get().is_none() {
            std::fs::create_dir_all(&self.root).map_err(|e| CacheError::Io {
                path: self.root.clone(),
                source: e,
            })?;
            let _ = self.created.set(());
            tracing::debug!(target = "esma.cache", root = %self.root.display(), "cache root ready");
        }
        Ok(&self.root)
    }

    /// Returns the file path for the entry with `key`.
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{key}.{ENTRY_EXT}"))
    }

    /// Returns `true` if an entry file exists for `key`.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entry_path(key).is_file()
    }

    /// Serializes `value` and writes it as the entry for `key`, replacing any
    /// previous entry. Returns the entry path.
    pub fn write<T: Serialize>(&self, key: &CacheKey, value: &T) -> Result<PathBuf, CacheError> {
        self.ensure_root()?;

        let payload = bincode::serde::encode_to_vec(value, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        let header = EntryHeader {
            magic: ENTRY_MAGIC,
            format_version: ENTRY_FORMAT_VERSION,
            checksum: ContentHash::from_bytes(&payload),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        // 4-byte header length (little-endian) + header + payload
        let header_len = header_bytes.len() as u32;
        let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        output.extend_from_slice(&header_len.to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(&payload);

        let path = self.entry_path(key);
        let tmp = self.root.join(format!(
            ".{key}.{}.{}.{TMP_EXT}",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        replace_with(&tmp, &path, |file| file.write_all(&output))?;
        Ok(path)
    }

    /// Reads and validates the entry for `key`.
    ///
    /// Returns `Ok(None)` if there is no entry, and an error if the entry
    /// exists but is truncated, carries a foreign header, fails its checksum,
    /// or does not decode as `T`.
    pub fn read<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>, CacheError> {
        let path = self.entry_path(key);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Io { path, source: e }),
        };

        let invalid = |reason: &str| CacheError::InvalidHeader {
            path: path.clone(),
            reason: reason.to_string(),
        };

        let Some(len_bytes) = raw.get(..4) else {
            return Err(invalid("file shorter than header length prefix"));
        };
        let mut len_buf = [0u8; 4];
        len_buf.copy_from_slice(len_bytes);
        let header_len = u32::from_le_bytes(len_buf) as usize;
        let Some(header_bytes) = raw.get(4..4usize.saturating_add(header_len)) else {
            return Err(invalid("truncated header"));
        };

        let (header, _): (EntryHeader, usize) =
            bincode::serde::decode_from_slice(header_bytes, bincode::config::standard())
                .map_err(|e| invalid(&e.to_string()))?;

        if header.magic != ENTRY_MAGIC {
            return Err(invalid("bad magic bytes"));
        }
        if header.format_version != ENTRY_FORMAT_VERSION {
            return Err(CacheError::VersionMismatch {
                path,
                expected: ENTRY_FORMAT_VERSION,
                actual: header.format_version,
            });
        }

        let payload = &raw[4 + header_len..];
        let actual = ContentHash::from_bytes(payload);
        if actual != header.checksum {
            return Err(CacheError::ChecksumMismatch {
                path,
                expected: header.checksum.to_string(),
                actual: actual.to_string(),
            });
        }

        let (value, _) = bincode::serde::decode_from_slice(payload, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: format!("{}: {e}", path.display()),
            })?;
        Ok(Some(value))
    }

    /// Deletes the entry for `key`. Returns `true` if a file was removed.
    pub fn remove(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let path = self.entry_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CacheError::Io { path, source: e }),
        }
    }
}

/// Writes `tmp` through `write` and renames it over `path`. The temporary
/// file is removed if either step fails.
fn replace_with(
    tmp: &Path,
    path: &Path,
    write: impl FnOnce(&mut File) -> io::Result<()>,
) -> Result<(), CacheError> {
    let written = File::create(tmp).and_then(|mut file| {
        write(&mut file)?;
        file.sync_all()
    });
    if let Err(e) = written {
        discard_tmp(tmp);
        return Err(CacheError::Io {
            path: tmp.to_path_buf(),
            source: e,
        });
    }
    if let Err(e) = std::fs::rename(tmp, path) {
        discard_tmp(tmp);
        return Err(CacheError::Io {
            path: path.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}

fn discard_tmp(tmp: &Path) {
    if let Err(e) = std::fs::remove_file(tmp) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::debug!(
                target = "esma.cache",
                path = %tmp.display(),
                error = %e,
                "failed to remove temporary file"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::CallSignature;

    fn make_store() -> (tempfile::TempDir, EntryStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = EntryStore::new(dir.path().join("data"));
        (dir, store)
    }

    fn key(name: &str) -> CacheKey {
        CallSignature::new("test").arg(name).key()
    }

    fn raw_entry(header: &EntryHeader, payload: &[u8]) -> Vec<u8> {
        let header_bytes =
            bincode::serde::encode_to_vec(header, bincode::config::standard()).unwrap();
        let mut output = Vec::new();
        output.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(payload);
        output
    }

    #[test]
    fn root_is_created_lazily() {
        let (_dir, store) = make_store();
        assert!(!store.root().exists());
        assert!(store.read::<Vec<String>>(&key("a")).unwrap().is_none());
        assert!(!store.root().exists());
        store.write(&key("a"), &vec!["x".to_string()]).unwrap();
        assert!(store.root().is_dir());
    }

    #[test]
    fn write_and_read_roundtrip() {
        let (_dir, store) = make_store();
        let value = vec![Some("DE0001".to_string()), None];
        store.write(&key("a"), &value).unwrap();
        let back: Vec<Option<String>> = store.read(&key("a")).unwrap().unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn entry_path_is_hex_key() {
        let (_dir, store) = make_store();
        let k = key("a");
        let path = store.entry_path(&k);
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), format!("{k}.bin"));
    }

    #[test]
    fn write_replaces_previous_entry() {
        let (_dir, store) = make_store();
        store.write(&key("a"), &1u32).unwrap();
        store.write(&key("a"), &2u32).unwrap();
        assert_eq!(store.read::<u32>(&key("a")).unwrap(), Some(2));
        let leftovers = std::fs::read_dir(store.root()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn garbage_is_invalid_header() {
        let (_dir, store) = make_store();
        store.ensure_root().unwrap();
        std::fs::write(store.entry_path(&key("a")), b"garbage bytes here").unwrap();
        let err = store.read::<u32>(&key("a")).unwrap_err();
        assert!(matches!(err, CacheError::InvalidHeader { .. }));
    }

    #[test]
    fn truncated_file_is_invalid_header() {
        let (_dir, store) = make_store();
        store.ensure_root().unwrap();
        std::fs::write(store.entry_path(&key("a")), b"AB").unwrap();
        assert!(matches!(
            store.read::<u32>(&key("a")),
            Err(CacheError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let (_dir, store) = make_store();
        store.ensure_root().unwrap();
        let header = EntryHeader {
            magic: *b"BAAD",
            format_version: ENTRY_FORMAT_VERSION,
            checksum: ContentHash::from_bytes(b"data"),
        };
        std::fs::write(store.entry_path(&key("a")), raw_entry(&header, b"data")).unwrap();
        assert!(matches!(
            store.read::<u32>(&key("a")),
            Err(CacheError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn wrong_version_is_rejected() {
        let (_dir, store) = make_store();
        store.ensure_root().unwrap();
        let header = EntryHeader {
            magic: ENTRY_MAGIC,
            format_version: 999,
            checksum: ContentHash::from_bytes(b"data"),
        };
        std::fs::write(store.entry_path(&key("a")), raw_entry(&header, b"data")).unwrap();
        assert!(matches!(
            store.read::<u32>(&key("a")),
            Err(CacheError::VersionMismatch { actual: 999, .. })
        ));
    }

    #[test]
    fn tampered_payload_fails_checksum() {
        let (_dir, store) = make_store();
        store.ensure_root().unwrap();
        let header = EntryHeader {
            magic: ENTRY_MAGIC,
            format_version: ENTRY_FORMAT_VERSION,
            checksum: ContentHash::from_bytes(b"data"),
        };
        std::fs::write(store.entry_path(&key("a")), raw_entry(&header, b"tampered")).unwrap();
        assert!(matches!(
            store.read::<u32>(&key("a")),
            Err(CacheError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn incompatible_payload_fails_to_decode() {
        let (_dir, store) = make_store();
        // Encodes as [len = 1, b'x']; as a Vec<String> the inner length runs
        // past the end of the payload.
        store.write(&key("a"), &"x".to_string()).unwrap();
        let err = store.read::<Vec<String>>(&key("a")).unwrap_err();
        assert!(matches!(err, CacheError::Serialization { .. }));
    }

    #[test]
    fn remove_reports_whether_an_entry_existed() {
        let (_dir, store) = make_store();
        store.write(&key("a"), &1u32).unwrap();
        store.write(&key("b"), &2u32).unwrap();
        assert!(store.remove(&key("a")).unwrap());
        assert!(!store.remove(&key("a")).unwrap());
        assert!(!store.contains(&key("a")));
        assert!(store.contains(&key("b")));
    }

    #[test]
    fn failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join(".entry.tmp");
        let path = dir.path().join("entry.bin");

        let err = replace_with(&tmp, &path, |file| {
            file.write_all(b"partial")?;
            Err(io::Error::other("disk full"))
        })
        .unwrap_err();

        assert!(matches!(err, CacheError::Io { .. }));
        assert!(!tmp.exists());
        assert!(!path.exists());
    }

    #[test]
    fn failed_rename_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join(".entry.tmp");
        // A non-empty directory cannot be replaced by a file.
        let path = dir.path().join("entry.bin");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let err = replace_with(&tmp, &path, |file| file.write_all(b"payload")).unwrap_err();

        assert!(matches!(err, CacheError::Io { .. }));
        assert!(!tmp.exists());
        assert!(path.join("keep").exists());
    }

    #[test]
    fn successful_write_leaves_only_the_entry() {
        let (_dir, store) = make_store();
        let path = store.write(&key("a"), &7u32).unwrap();
        let files: Vec<_> = std::fs::read_dir(store.root())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(files, vec![path]);
    }
}
