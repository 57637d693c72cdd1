//! Fetching, parsing and caching of ESMA register files.
//!
//! [`EsmaDataLoader`] ties the pieces together: it builds query URLs
//! ([`query`]), fetches them through a [`Transport`], unpacks zipped XML
//! payloads ([`archive`]), flattens them with `esma_xml` and memoizes the
//! resulting tables with `esma_cache`.

#![warn(missing_docs)]

pub mod archive;
pub mod error;
pub mod json;
pub mod latest;
pub mod loader;
pub mod query;
pub mod ssr;
pub mod transport;

pub use archive::extract_first_xml;
pub use error::{FetchError, LoaderError};
pub use latest::{FileNameParts, LatestFilesRequest};
pub use loader::{DownloadTask, EsmaDataLoader, QueryWindow};
pub use query::{Cfi, Dataset};
pub use ssr::SSR_COUNTRIES;
pub use transport::{HttpTransport, Transport};
