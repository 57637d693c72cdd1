//! Short-selling regulation exempted shares.

use std::collections::{HashMap, HashSet};

use esma_common::Table;

use crate::error::LoaderError;

/// Countries queried for exempted shares: the EU member states, Norway and
/// the United Kingdom.
pub const SSR_COUNTRIES: [&str; 29] = [
    "AT", "BE", "BG", "CY", "CZ", "DE", "DK", "EE", "ES", "FI", "FR", "GR", "HR", "HU", "IE",
    "IT", "LT", "LU", "LV", "MT", "NL", "PL", "PT", "RO", "SE", "SI", "SK", "NO", "GB",
];

const ISIN: &str = "shs_isin";
const MODIFICATION_B_DATE: &str = "shs_modificationBDate";
const EXEMPTION_START_DATE: &str = "shs_exemptionStartDate";
const MODIFICATION_DATE: &str = "shs_modificationDateStr";

/// Keeps the exemptions in force on `today` (`YYYY-MM-DD`).
///
/// A row is in force when its modification date lies after `today` and its
/// exemption started on or before it. For ISINs listed more than once, only
/// the rows modified on or before `today` are kept; those rows come first,
/// followed by every other row in force. Dates compare as strings, and a
/// missing date never satisfies a comparison.
pub fn filter_in_force(shares: &Table, today: &str) -> Result<Table, LoaderError> {
    if shares.is_empty() {
        return Ok(shares.clone());
    }
    for column in [ISIN, MODIFICATION_B_DATE, EXEMPTION_START_DATE, MODIFICATION_DATE] {
        if !shares.has_column(column) {
            return Err(LoaderError::MissingColumn(column.to_string()));
        }
    }

    let in_force = shares.filter(|row| {
        row.get(MODIFICATION_B_DATE).is_some_and(|d| d > today)
            && row.get(EXEMPTION_START_DATE).is_some_and(|d| d <= today)
    });

    let mut occurrences: HashMap<Option<&str>, usize> = HashMap::new();
    for row in in_force.rows() {
        *occurrences.entry(row.get(ISIN)).or_default() += 1;
    }

    let duplicates = in_force.filter(|row| {
        occurrences.get(&row.get(ISIN)).is_some_and(|&n| n > 1)
            && row.get(MODIFICATION_DATE).is_some_and(|d| d <= today)
    });
    let kept: HashSet<Option<&str>> = duplicates.rows().map(|row| row.get(ISIN)).collect();
    let others = in_force.filter(|row| !kept.contains(&row.get(ISIN)));

    Ok(Table::concat([duplicates, others]))
}
