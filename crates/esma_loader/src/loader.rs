//! The register data loader.

use std::time::Duration;

use chrono::NaiveDate;
use esma_cache::{default_root, CallOptions, CallSignature, ResultCache};
use esma_common::Table;
use esma_config::{EsmaConfig, QueryConfig};
use esma_xml::{parse_document, read_document, read_listing, Layout};
use rayon::prelude::*;

use crate::archive::extract_first_xml;
use crate::error::{FetchError, LoaderError};
use crate::json;
use crate::latest::{self, LatestFilesRequest};
use crate::query::{self, Dataset};
use crate::ssr::{self, SSR_COUNTRIES};
use crate::transport::{HttpTransport, Transport};

/// Column added to every downloaded table, holding the source URL.
pub const URL_COLUMN: &str = "url";

/// Date window and page size for file-list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    /// First date included.
    pub creation_date_from: NaiveDate,
    /// Last date included.
    pub creation_date_to: NaiveDate,
    /// Maximum rows per listing request.
    pub limit: u32,
}

impl From<&QueryConfig> for QueryWindow {
    fn from(config: &QueryConfig) -> Self {
        Self {
            creation_date_from: config.creation_date_from,
            creation_date_to: config.date_to(),
            limit: config.limit,
        }
    }
}

impl Default for QueryWindow {
    fn default() -> Self {
        Self::from(&QueryConfig::default())
    }
}

/// One unit of a batch download. Each worker gets everything it needs in
/// the task itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Position of the URL in the batch; results are ordered by it.
    pub index: usize,
    /// File to download.
    pub url: String,
    /// Caching controls for this file.
    pub options: CallOptions,
}

/// Fetches register listings and disclosure files and turns them into tables.
pub struct EsmaDataLoader {
    transport: Box<dyn Transport>,
    cache: ResultCache,
    window: QueryWindow,
    workers: usize,
}

impl EsmaDataLoader {
    /// Default size of the download worker pool.
    pub const DEFAULT_WORKERS: usize = 4;

    /// Creates a loader with the default query window and worker count.
    pub fn new(transport: impl Transport + 'static, cache: ResultCache) -> Self {
        Self {
            transport: Box::new(transport),
            cache,
            window: QueryWindow::default(),
            workers: Self::DEFAULT_WORKERS,
        }
    }

    /// Creates an HTTP loader configured from `esma.toml` settings.
    pub fn from_config(config: &EsmaConfig) -> Result<Self, LoaderError> {
        let root = match &config.cache.root {
            Some(root) => root.clone(),
            None => default_root(&config.cache.folder)?,
        };
        let cache = ResultCache::new(root).with_hit_notices(config.cache.print_cached_data);
        let transport =
            HttpTransport::with_timeout(Duration::from_secs(config.download.timeout_secs));
        Ok(Self::new(transport, cache)
            .with_window(QueryWindow::from(&config.query))
            .with_workers(config.download.workers))
    }

    /// Sets the query window.
    pub fn with_window(mut self, window: QueryWindow) -> Self {
        self.window = window;
        self
    }

    /// Sets the download pool size. Zero is treated as one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// The query window.
    pub fn window(&self) -> QueryWindow {
        self.window
    }

    /// The result cache.
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// File lists of the given datasets, concatenated.
    ///
    /// A dataset whose listing request is refused contributes no rows.
    pub fn load_mifid_file_list(&self, datasets: &[Dataset]) -> Result<Table, LoaderError> {
        tracing::info!(target = "esma.loader", count = datasets.len(), "loading datasets");
        let mut files = Table::new();
        for &dataset in datasets {
            tracing::info!(target = "esma.loader", %dataset, "loading dataset");
            files.append(self.dataset_file_list(dataset)?);
        }
        tracing::info!(target = "esma.loader", rows = files.len(), "process done");
        Ok(files)
    }

    fn dataset_file_list(&self, dataset: Dataset) -> Result<Table, LoaderError> {
        let url = query::mifid_files_url(
            dataset,
            self.window.creation_date_from,
            self.window.creation_date_to,
            self.window.limit,
        );
        let body = match self.transport.get(&url) {
            Ok(body) => body,
            Err(FetchError::Status { code, .. }) => {
                tracing::error!(target = "esma.loader", %dataset, code, "request failed");
                return Ok(Table::new());
            }
            Err(err) => return Err(err.into()),
        };
        let text = utf8(body, &url)?;
        let root = parse_document(&text)?;
        Ok(Table::from_records(&read_listing(&root)))
    }

    /// FCA FIRDS full-file list.
    pub fn load_fca_firds_file_list(&self) -> Result<Table, LoaderError> {
        let url = query::fca_firds_url(
            self.window.creation_date_from,
            self.window.creation_date_to,
            self.window.limit,
        );
        tracing::info!(target = "esma.loader", "requesting FCA FIRDS files");
        let body = json::parse_body(&self.transport.get(&url)?, &url)?;
        let hits = json::array_at(&body, "/hits/hits", &url)?;
        let sources = hits
            .iter()
            .map(|hit| {
                hit.get("_source").ok_or_else(|| LoaderError::Json {
                    url: url.clone(),
                    reason: "hit without _source".to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let records = json::records_from_objects(sources, &url)?;
        tracing::info!(target = "esma.loader", rows = records.len(), "process done");
        Ok(Table::from_records(&records))
    }

    /// Downloads and concatenates the most recent files matching `request`.
    pub fn load_latest_files(&self, request: &LatestFilesRequest) -> Result<Table, LoaderError> {
        let files = if request.vcap {
            latest::select_latest_dvcap(&self.dataset_file_list(Dataset::Dvcap)?)?
        } else {
            latest::select_latest_fitrs(
                &self.dataset_file_list(Dataset::Fitrs)?,
                &request.file_type,
                request.cfi,
                request.equity,
            )?
        };
        let files = latest::filter_by_isin(files, &request.isin);
        let urls = latest::download_links(&files)?;

        if request.options.save {
            tracing::info!(target = "esma.loader", "saving files locally");
        } else {
            tracing::info!(
                target = "esma.loader",
                "files will not be saved locally, set save=true to save them"
            );
        }
        self.download_files(&urls, request.options)
    }

    /// Downloads a transparency file and flattens its blocks. Cached under
    /// the URL.
    pub fn download_and_parse_file(&self, url: &str, options: CallOptions) -> Result<Table, LoaderError> {
        self.download_cached("download_and_parse_file", url, Layout::default(), options)
    }

    /// Downloads a reference-data file with the positional layout. Cached
    /// under the URL.
    pub fn download_and_parse_reference_file(
        &self,
        url: &str,
        options: CallOptions,
    ) -> Result<Table, LoaderError> {
        self.download_cached("download_and_parse_reference_file", url, Layout::Positional, options)
    }

    fn download_cached(
        &self,
        operation: &str,
        url: &str,
        layout: Layout,
        options: CallOptions,
    ) -> Result<Table, LoaderError> {
        let key = CallSignature::new(operation).arg(url).key();
        let mut table = self
            .cache
            .get_or_compute(&key, options, |_| self.fetch_and_parse(url, layout))?;
        table.add_constant_column(URL_COLUMN, Some(url.to_string()));
        Ok(table)
    }

    fn fetch_and_parse(&self, url: &str, layout: Layout) -> Result<Table, LoaderError> {
        let body = self.transport.get(url)?;
        let xml = extract_first_xml(&body, url)?;
        let progress = |done: usize, total: usize| {
            if done == total || done % 10_000 == 0 {
                tracing::debug!(target = "esma.loader", url, done, total, "parsing file");
            }
        };
        let records = read_document(&xml, layout, &progress)?;
        Ok(Table::from_records(&records))
    }

    /// Downloads `urls` on the worker pool and concatenates the tables in
    /// input order. The first failure, in input order, is returned.
    pub fn download_files(&self, urls: &[String], options: CallOptions) -> Result<Table, LoaderError> {
        tracing::info!(target = "esma.loader", files = urls.len(), "downloading files");
        let tasks: Vec<DownloadTask> = urls
            .iter()
            .enumerate()
            .map(|(index, url)| DownloadTask {
                index,
                url: url.clone(),
                options,
            })
            .collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|idx| format!("esma-download-{idx}"))
            .build();
        let mut results: Vec<(usize, Result<Table, LoaderError>)> = match pool {
            Ok(pool) => pool.install(|| tasks.into_par_iter().map(|task| self.run_task(task)).collect()),
            Err(err) => {
                tracing::warn!(
                    target = "esma.loader",
                    ?err,
                    "failed to create download pool, downloading sequentially"
                );
                tasks.into_iter().map(|task| self.run_task(task)).collect()
            }
        };
        results.sort_by_key(|(index, _)| *index);

        let tables = results
            .into_iter()
            .map(|(_, result)| result)
            .collect::<Result<Vec<_>, _>>()?;
        let combined = Table::concat(tables);
        tracing::info!(target = "esma.loader", rows = combined.len(), "process done");
        Ok(combined)
    }

    fn run_task(&self, task: DownloadTask) -> (usize, Result<Table, LoaderError>) {
        tracing::info!(target = "esma.loader", index = task.index, url = %task.url, "downloading and parsing");
        (task.index, self.download_and_parse_file(&task.url, task.options))
    }

    /// Short-selling exempted shares of every country in [`SSR_COUNTRIES`].
    ///
    /// With `today`, only the exemptions in force on that date are kept (see
    /// [`ssr::filter_in_force`]). Countries whose request is refused are
    /// skipped with a warning.
    pub fn load_ssr_exempted_shares(&self, today: Option<NaiveDate>) -> Result<Table, LoaderError> {
        tracing::info!(target = "esma.loader", "requesting SSR exempted shares");
        let mut shares = Table::new();
        for country in SSR_COUNTRIES {
            let url = query::ssr_url(country);
            let body = match self.transport.get(&url) {
                Ok(body) => body,
                Err(FetchError::Status { code, .. }) => {
                    tracing::warn!(target = "esma.loader", country, code, "request failed");
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            let body = json::parse_body(&body, &url)?;
            let docs = json::array_at(&body, "/response/docs", &url)?;
            shares.append(Table::from_records(&json::records_from_objects(docs, &url)?));
            tracing::debug!(target = "esma.loader", country, total = shares.len(), "country loaded");
        }

        let Some(today) = today else {
            tracing::info!(target = "esma.loader", rows = shares.len(), "process done");
            return Ok(shares);
        };
        tracing::info!(target = "esma.loader", %today, "filtering for the given date");
        let in_force = ssr::filter_in_force(&shares, &today.format("%Y-%m-%d").to_string())?;
        tracing::info!(target = "esma.loader", rows = in_force.len(), "process done");
        Ok(in_force)
    }
}

fn utf8(body: Vec<u8>, url: &str) -> Result<String, LoaderError> {
    String::from_utf8(body).map_err(|_| LoaderError::Encoding {
        url: url.to_string(),
    })
}
