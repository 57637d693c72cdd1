//! Error types for loader operations.

use esma_cache::CacheError;
use esma_xml::XmlError;

/// Errors raised while fetching a URL.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("server returned status {code} for {url}")]
    Status {
        /// The requested URL.
        url: String,
        /// The HTTP status code.
        code: u16,
    },

    /// The request could not be completed.
    #[error("transport error for {url}: {reason}")]
    Transport {
        /// The requested URL.
        url: String,
        /// Description of the failure.
        reason: String,
    },
}

/// Errors that can occur while loading register data.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// Fetching a URL failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A downloaded payload is not a usable zip archive.
    #[error("invalid archive from {url}: {reason}")]
    Archive {
        /// Where the payload came from.
        url: String,
        /// Description of the problem.
        reason: String,
    },

    /// A response body is not valid UTF-8.
    #[error("response from {url} is not valid UTF-8")]
    Encoding {
        /// The requested URL.
        url: String,
    },

    /// A JSON response could not be decoded or lacks the expected shape.
    #[error("unexpected JSON from {url}: {reason}")]
    Json {
        /// The requested URL.
        url: String,
        /// Description of the problem.
        reason: String,
    },

    /// An XML document could not be flattened.
    #[error(transparent)]
    Xml(#[from] XmlError),

    /// The cache could not be set up.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A dataset name outside `fitrs`, `firds` and `dvcap`.
    #[error("unknown dataset '{0}', expected one of fitrs, firds, dvcap")]
    UnknownDataset(String),

    /// A CFI class outside C, D, E, F, H, I, J, O, R and S.
    #[error("unknown CFI class '{0}'")]
    UnknownCfi(String),

    /// A file list lacks a column needed to select files.
    #[error("file list has no '{0}' column")]
    MissingColumn(String),
}
