//! Configuration types deserialized from `esma.toml`.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;

/// The top-level configuration parsed from `esma.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct EsmaConfig {
    /// Result cache location and notices.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Register query window and page size.
    #[serde(default)]
    pub query: QueryConfig,
    /// Batch download behavior.
    #[serde(default)]
    pub download: DownloadConfig,
}

/// Where cached results live and whether cache hits are announced.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Explicit cache directory. When absent the cache lives in
    /// `$HOME/esma_data_py/<folder>`.
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Folder name under `$HOME/esma_data_py`.
    #[serde(default = "default_folder")]
    pub folder: String,
    /// Log a notice the first time each cached entry is served.
    #[serde(default = "default_true")]
    pub print_cached_data: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: None,
            folder: default_folder(),
            print_cached_data: true,
        }
    }
}

/// Date window and page size for file-list queries.
///
/// Dates are ISO `YYYY-MM-DD` strings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct QueryConfig {
    /// First creation (or publication) date included.
    #[serde(default = "default_date_from")]
    pub creation_date_from: NaiveDate,
    /// Last date included. Defaults to the current local date.
    #[serde(default)]
    pub creation_date_to: Option<NaiveDate>,
    /// Maximum number of rows requested from a listing service.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl QueryConfig {
    /// The configured end date, or today.
    pub fn date_to(&self) -> NaiveDate {
        self.creation_date_to
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            creation_date_from: default_date_from(),
            creation_date_to: None,
            limit: default_limit(),
        }
    }
}

/// Settings for downloading and parsing disclosure files.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Size of the worker pool used for batch downloads.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Persist freshly parsed files in the cache.
    #[serde(default)]
    pub save: bool,
    /// Ignore cached entries and fetch again.
    #[serde(default)]
    pub update: bool,
    /// Read timeout of one HTTP request, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            save: false,
            update: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_folder() -> String {
    "data".to_string()
}

fn default_true() -> bool {
    true
}

fn default_date_from() -> NaiveDate {
    NaiveDate::from_ymd_opt(2017, 1, 1).unwrap_or_default()
}

fn default_limit() -> u32 {
    10_000
}

fn default_workers() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    300
}
