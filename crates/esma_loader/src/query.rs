//! Register query URLs and the enumerations they are parameterized by.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::LoaderError;

/// A MiFID register file dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    /// Transparency calculation results.
    Fitrs,
    /// Financial instruments reference data.
    Firds,
    /// Double volume cap results.
    Dvcap,
}

impl Dataset {
    /// All datasets, in the default listing order.
    pub const ALL: [Dataset; 3] = [Dataset::Dvcap, Dataset::Fitrs, Dataset::Firds];

    /// The lowercase name used in register URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            Dataset::Fitrs => "fitrs",
            Dataset::Firds => "firds",
            Dataset::Dvcap => "dvcap",
        }
    }

    /// The listing column the date window applies to.
    pub fn date_column(self) -> &'static str {
        match self {
            Dataset::Firds => "publication_date",
            Dataset::Fitrs | Dataset::Dvcap => "creation_date",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dataset {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fitrs" => Ok(Dataset::Fitrs),
            "firds" => Ok(Dataset::Firds),
            "dvcap" => Ok(Dataset::Dvcap),
            other => Err(LoaderError::UnknownDataset(other.to_string())),
        }
    }
}

/// First letter of an ISO 10962 CFI code, the instrument category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cfi {
    /// Collective investment vehicles.
    C,
    /// Debt instruments.
    D,
    /// Equities.
    E,
    /// Futures.
    F,
    /// Non-listed and complex listed options.
    H,
    /// Spot.
    I,
    /// Forwards.
    J,
    /// Listed options.
    O,
    /// Entitlements (rights).
    R,
    /// Swaps.
    S,
}

impl Cfi {
    /// The single-letter code.
    pub fn as_str(self) -> &'static str {
        match self {
            Cfi::C => "C",
            Cfi::D => "D",
            Cfi::E => "E",
            Cfi::F => "F",
            Cfi::H => "H",
            Cfi::I => "I",
            Cfi::J => "J",
            Cfi::O => "O",
            Cfi::R => "R",
            Cfi::S => "S",
        }
    }
}

impl fmt::Display for Cfi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cfi {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "C" => Cfi::C,
            "D" => Cfi::D,
            "E" => Cfi::E,
            "F" => Cfi::F,
            "H" => Cfi::H,
            "I" => Cfi::I,
            "J" => Cfi::J,
            "O" => Cfi::O,
            "R" => Cfi::R,
            "S" => Cfi::S,
            other => return Err(LoaderError::UnknownCfi(other.to_string())),
        })
    }
}

const ESMA_REGISTERS: &str = "https://registers.esma.europa.eu/solr";

const FCA_FIRDS_FILES: &str = "https://api.data.fca.org.uk/fca_data_firds_files";

/// File list of one MiFID dataset, as an XML `<doc>` listing.
pub fn mifid_files_url(dataset: Dataset, from: NaiveDate, to: NaiveDate, limit: u32) -> String {
    format!(
        "{ESMA_REGISTERS}/esma_registers_{db}_files/select?q=*\
         &fq={column}:%5B{from}T00:00:00Z+TO+{to}T23:59:59Z%5D\
         &wt=xml&indent=true&start=0&rows={limit}",
        db = dataset.as_str(),
        column = dataset.date_column(),
        from = from.format("%Y-%m-%d"),
        to = to.format("%Y-%m-%d"),
    )
}

/// FCA FIRDS full-file list, as a JSON search response.
pub fn fca_firds_url(from: NaiveDate, to: NaiveDate, limit: u32) -> String {
    format!(
        "{FCA_FIRDS_FILES}?q=((file_type:FULINS)%20AND%20(publication_date:[{from}%20TO%20{to}]))\
         &from=0&size={limit}",
        from = from.format("%Y-%m-%d"),
        to = to.format("%Y-%m-%d"),
    )
}

/// Short-selling exempted shares of one country, as a JSON search response.
pub fn ssr_url(country: &str) -> String {
    format!(
        "{ESMA_REGISTERS}/esma_registers_mifid_shsexs/select?\
         q=({{!parent%20which=%27type_s:parent%27}})&wt=json&indent=true&rows=150000\
         &fq=(shs_countryCode:{country})"
    )
}
