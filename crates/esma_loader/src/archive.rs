//! Zip payload handling.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::error::LoaderError;

/// Returns the text of the first `.xml` entry of a zip payload.
///
/// `url` only labels errors.
pub fn extract_first_xml(bytes: &[u8], url: &str) -> Result<String, LoaderError> {
    let archive_error = |reason: String| LoaderError::Archive {
        url: url.to_string(),
        reason,
    };

    let mut zip = ZipArchive::new(Cursor::new(bytes)).map_err(|e| archive_error(e.to_string()))?;
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).map_err(|e| archive_error(e.to_string()))?;
        if entry.is_dir() || !entry.name().to_ascii_lowercase().ends_with(".xml") {
            continue;
        }
        let name = entry.name().to_string();
        let mut raw = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry
            .read_to_end(&mut raw)
            .map_err(|e| archive_error(format!("failed to read {name}: {e}")))?;
        tracing::debug!(target = "esma.loader", url, entry = %name, bytes = raw.len(), "extracted");
        return String::from_utf8(raw).map_err(|_| LoaderError::Encoding {
            url: format!("{url}!{name}"),
        });
    }
    Err(archive_error("no .xml entry".to_string()))
}
