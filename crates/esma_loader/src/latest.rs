//! Selection of the most recent full files from a FITRS or DVCAP listing.

use std::collections::HashSet;
use std::sync::LazyLock;

use esma_cache::CallOptions;
use esma_common::{FlatRecord, Table};
use regex::Regex;

use crate::error::LoaderError;
use crate::query::Cfi;

/// `FULECR_20250308_E_1of1.zip`: type, date, optional CFI, part number.
static FITRS_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<filetype>[A-Za-z]+)_(?P<date>\d{8})(?:_(?P<cfi>[A-Za-z]+))?_(?P<nfile>\d+of\d+)\.zip")
        .expect("FITRS file name pattern")
});

/// `DVRES_20240315_...`: type and date only.
static DVCAP_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<filetype>[A-Za-z]+)_(?P<date>\d{8})").expect("DVCAP file name pattern")
});

const FILE_NAME: &str = "file_name";
const FILE_TYPE: &str = "file_type";
const INSTRUMENT_TYPE: &str = "instrument_type";
const DOWNLOAD_LINK: &str = "download_link";
const ISIN: &str = "Id";

/// Instrument type of equity transparency files.
pub const EQUITY_INSTRUMENTS: &str = "Equity Instruments";
/// Instrument type of non-equity transparency files.
pub const NON_EQUITY_INSTRUMENTS: &str = "Non-Equity Instruments";

/// Parameters of [`EsmaDataLoader::load_latest_files`](crate::EsmaDataLoader::load_latest_files).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestFilesRequest {
    /// Listing `file_type` to keep, `Full` by default.
    pub file_type: String,
    /// Select from the double volume cap listing instead of FITRS.
    pub vcap: bool,
    /// Keep only files whose `Id` is one of these, if any match.
    pub isin: Vec<String>,
    /// Instrument category of the files.
    pub cfi: Cfi,
    /// Equity (`true`) or non-equity instruments.
    pub equity: bool,
    /// Caching controls for each download.
    pub options: CallOptions,
}

impl Default for LatestFilesRequest {
    fn default() -> Self {
        Self {
            file_type: "Full".to_string(),
            vcap: false,
            isin: Vec::new(),
            cfi: Cfi::E,
            equity: true,
            options: CallOptions::default(),
        }
    }
}

/// Components of a register file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNameParts {
    /// Leading alphabetic type, e.g. `FULECR`.
    pub file_type: String,
    /// `YYYYMMDD` date.
    pub date: String,
    /// CFI letters, when present.
    pub cfi: Option<String>,
    /// `NofM` part number, absent for DVCAP names.
    pub part: Option<String>,
}

impl FileNameParts {
    /// Parses a FITRS name. The pattern may match anywhere in `name`.
    pub fn parse_fitrs(name: &str) -> Option<Self> {
        let caps = FITRS_FILE_NAME.captures(name)?;
        Some(Self {
            file_type: caps["filetype"].to_string(),
            date: caps["date"].to_string(),
            cfi: caps.name("cfi").map(|m| m.as_str().to_string()),
            part: Some(caps["nfile"].to_string()),
        })
    }

    /// Parses the `TYPE_YYYYMMDD` prefix of a DVCAP name.
    pub fn parse_dvcap(name: &str) -> Option<Self> {
        let caps = DVCAP_FILE_NAME.captures(name)?;
        Some(Self {
            file_type: caps["filetype"].to_string(),
            date: caps["date"].to_string(),
            cfi: None,
            part: None,
        })
    }

    fn annotate(&self, record: &mut FlatRecord) {
        record.insert("filetype", Some(self.file_type.clone()));
        record.insert("date", Some(self.date.clone()));
        record.insert("cfi", self.cfi.clone());
        record.insert("nfile", self.part.clone());
    }
}

fn require(files: &Table, column: &str) -> Result<(), LoaderError> {
    if files.has_column(column) {
        Ok(())
    } else {
        Err(LoaderError::MissingColumn(column.to_string()))
    }
}

/// Adds the parsed name components of every row as columns and keeps the
/// rows for which `parse` succeeded.
fn explode_file_names(
    files: &Table,
    parse: fn(&str) -> Option<FileNameParts>,
) -> Result<Vec<(FileNameParts, FlatRecord)>, LoaderError> {
    require(files, FILE_NAME)?;
    Ok(files
        .to_records()
        .into_iter()
        .filter_map(|mut record| {
            let parts = record.value(FILE_NAME).and_then(parse)?;
            parts.annotate(&mut record);
            Some((parts, record))
        })
        .collect())
}

/// Latest full files of one CFI class and instrument type.
///
/// The latest date is taken over every file of the requested type and class,
/// before the instrument-type filter. A listing without rows gives an empty
/// table.
pub fn select_latest_fitrs(
    files: &Table,
    file_type: &str,
    cfi: Cfi,
    equity: bool,
) -> Result<Table, LoaderError> {
    if files.is_empty() {
        return Ok(Table::new());
    }
    require(files, FILE_TYPE)?;
    require(files, INSTRUMENT_TYPE)?;

    let of_type = files.filter(|row| row.get(FILE_TYPE) == Some(file_type));
    let candidates: Vec<_> = explode_file_names(&of_type, FileNameParts::parse_fitrs)?
        .into_iter()
        .filter(|(parts, _)| parts.cfi.as_deref() == Some(cfi.as_str()))
        .collect();
    let Some(latest) = candidates.iter().map(|(parts, _)| parts.date.clone()).max() else {
        return Ok(Table::new());
    };

    let instrument_type = if equity {
        EQUITY_INSTRUMENTS
    } else {
        NON_EQUITY_INSTRUMENTS
    };
    let selected: Vec<_> = candidates
        .into_iter()
        .filter(|(parts, record)| {
            parts.date == latest && record.value(INSTRUMENT_TYPE) == Some(instrument_type)
        })
        .map(|(_, record)| record)
        .collect();
    Ok(Table::from_records(&selected))
}

/// DVCAP files carrying the latest date.
pub fn select_latest_dvcap(files: &Table) -> Result<Table, LoaderError> {
    if files.is_empty() {
        return Ok(Table::new());
    }
    let candidates = explode_file_names(files, FileNameParts::parse_dvcap)?;
    let Some(latest) = candidates.iter().map(|(parts, _)| parts.date.clone()).max() else {
        return Ok(Table::new());
    };
    let selected: Vec<_> = candidates
        .into_iter()
        .filter(|(parts, _)| parts.date == latest)
        .map(|(_, record)| record)
        .collect();
    Ok(Table::from_records(&selected))
}

/// Narrows `files` to rows whose `Id` is in `isins`.
///
/// When nothing matches, or the listing has no `Id` column, the full list is
/// kept and a warning logged.
pub fn filter_by_isin(files: Table, isins: &[String]) -> Table {
    if isins.is_empty() {
        return files;
    }
    tracing::info!(target = "esma.loader", count = isins.len(), "filtering records for the given ISINs");
    let wanted: HashSet<&str> = isins.iter().map(String::as_str).collect();
    let narrowed = files.filter(|row| row.get(ISIN).is_some_and(|id| wanted.contains(id)));
    if narrowed.is_empty() {
        tracing::warn!(target = "esma.loader", "no record found for the given ISINs, keeping default");
        files
    } else {
        narrowed
    }
}

/// Distinct download links of a file list, in listing order.
pub fn download_links(files: &Table) -> Result<Vec<String>, LoaderError> {
    if files.is_empty() {
        return Ok(Vec::new());
    }
    require(files, DOWNLOAD_LINK)?;
    Ok(files.unique(DOWNLOAD_LINK))
}
