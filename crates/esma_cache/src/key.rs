//! Cache key derivation.

use std::collections::BTreeMap;
use std::fmt;

use esma_common::ContentHash;

/// Keyword names that steer caching instead of describing the call. They
/// never participate in a key.
pub const CONTROL_FLAGS: &[&str] = &["update", "save"];

/// Caching controls for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Recompute and overwrite even if an entry exists.
    pub update: bool,
    /// Persist a freshly computed result.
    pub save: bool,
}

/// The identifying parts of a call: operation name, positional arguments and
/// value-bearing keyword arguments, all stringified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSignature {
    operation: String,
    args: Vec<String>,
    kwargs: BTreeMap<String, String>,
}

impl CallSignature {
    /// Starts a signature for `operation`.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
        }
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.args.push(value.to_string());
        self
    }

    /// Sets a keyword argument. Names in [`CONTROL_FLAGS`] are ignored.
    pub fn kwarg(mut self, name: &str, value: impl fmt::Display) -> Self {
        if !CONTROL_FLAGS.contains(&name) {
            self.kwargs.insert(name.to_string(), value.to_string());
        }
        self
    }

    /// Derives the key. Keyword order does not matter; every component is
    /// length-prefixed so that no two distinct signatures share an encoding.
    pub fn key(&self) -> CacheKey {
        let mut buf = Vec::new();
        push_component(&mut buf, &self.operation);
        buf.extend_from_slice(&(self.args.len() as u64).to_le_bytes());
        for arg in &self.args {
            push_component(&mut buf, arg);
        }
        buf.extend_from_slice(&(self.kwargs.len() as u64).to_le_bytes());
        for (name, value) in &self.kwargs {
            push_component(&mut buf, name);
            push_component(&mut buf, value);
        }
        CacheKey(ContentHash::from_bytes(&buf))
    }
}

fn push_component(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u64).to_le_bytes());
    buf.extend_from_slice(s.as_bytes());
}

/// Digest identifying one logical call. Rendered as 32 hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(ContentHash);

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://fitrs.esma.europa.eu/fitrs/FULECR_20250308_E_1of1.zip";

    fn download(url: &str) -> CallSignature {
        CallSignature::new("download_and_parse_file").arg(url)
    }

    #[test]
    fn identical_calls_share_a_key() {
        assert_eq!(download(URL).key(), download(URL).key());
    }

    #[test]
    fn positional_args_change_the_key() {
        assert_ne!(download(URL).key(), download("https://other/x.zip").key());
    }

    #[test]
    fn operation_name_changes_the_key() {
        let a = CallSignature::new("a").arg(URL).key();
        let b = CallSignature::new("b").arg(URL).key();
        assert_ne!(a, b);
    }

    #[test]
    fn value_bearing_kwargs_change_the_key() {
        let a = download(URL).kwarg("cfi", "E").key();
        let b = download(URL).kwarg("cfi", "D").key();
        assert_ne!(a, b);
        assert_ne!(a, download(URL).key());
    }

    #[test]
    fn control_flags_do_not_change_the_key() {
        let base = download(URL).key();
        let flagged = download(URL).kwarg("update", true).kwarg("save", false).key();
        assert_eq!(base, flagged);
        let other = download(URL).kwarg("update", false).kwarg("save", true).key();
        assert_eq!(base, other);
    }

    #[test]
    fn kwarg_order_is_irrelevant() {
        let a = download(URL).kwarg("cfi", "E").kwarg("eqt", true).key();
        let b = download(URL).kwarg("eqt", true).kwarg("cfi", "E").key();
        assert_eq!(a, b);
    }

    #[test]
    fn components_do_not_run_together() {
        let a = CallSignature::new("op").arg("ab").arg("c").key();
        let b = CallSignature::new("op").arg("a").arg("bc").key();
        assert_ne!(a, b);
        let c = CallSignature::new("op").kwarg("x", "1").key();
        let d = CallSignature::new("op").arg("x").arg("1").key();
        assert_ne!(c, d);
    }

    #[test]
    fn display_is_hex_digest() {
        let s = download(URL).key().to_string();
        assert_eq!(s.len(), 32);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
