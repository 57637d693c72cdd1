//! Column-oriented tabular container for flattened records.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::record::FlatRecord;

/// Name of the positional-index column left behind by some serialization
/// round-trips. It never carries data and is dropped from cached results.
pub const INDEX_ARTIFACT_COLUMN: &str = "Unnamed: 0";

/// An ordered collection of named columns with nullable string cells.
///
/// Columns are the union of all keys seen, in first-seen order. Rows that
/// lack a column hold `None` in that position. Every row has exactly
/// `columns().len()` cells; deserialization rejects any other shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    columns: IndexSet<String>,
    rows: Vec<Vec<Option<String>>>,
}

/// Serialized form of a [`Table`] before its shape is checked.
#[derive(Deserialize)]
struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

/// A decoded table whose columns and rows do not line up.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableShapeError {
    /// The same column name appears twice.
    #[error("duplicate column `{0}`")]
    DuplicateColumn(String),

    /// A row does not have one cell per column.
    #[error("row {row} has {cells} cells but the table has {columns} columns")]
    RowWidth {
        /// Position of the offending row.
        row: usize,
        /// Cells found in that row.
        cells: usize,
        /// Number of columns.
        columns: usize,
    },
}

impl TryFrom<RawTable> for Table {
    type Error = TableShapeError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        let mut columns = IndexSet::with_capacity(raw.columns.len());
        for name in raw.columns {
            if columns.contains(&name) {
                return Err(TableShapeError::DuplicateColumn(name));
            }
            columns.insert(name);
        }
        if let Some((row, cells)) = raw
            .rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != columns.len())
        {
            return Err(TableShapeError::RowWidth {
                row,
                cells: cells.len(),
                columns: columns.len(),
            });
        }
        Ok(Self {
            columns,
            rows: raw.rows,
        })
    }
}

/// A borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a IndexSet<String>,
    cells: &'a [Option<String>],
}

impl<'a> Row<'a> {
    /// Returns the non-null cell value in column `name`.
    pub fn get(&self, name: &str) -> Option<&'a str> {
        let idx = self.columns.get_index_of(name)?;
        self.cells[idx].as_deref()
    }

    /// Cells in column order.
    pub fn cells(&self) -> &'a [Option<String>] {
        self.cells
    }
}

impl Table {
    /// Creates an empty table with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from records, filling missing cells with `None`.
    pub fn from_records<'r>(records: impl IntoIterator<Item = &'r FlatRecord>) -> Self {
        let mut table = Table::new();
        for record in records {
            table.push_record(record);
        }
        table
    }

    /// Appends a record as a new row, adding any unseen columns.
    pub fn push_record(&mut self, record: &FlatRecord) {
        for key in record.keys() {
            if !self.columns.contains(key) {
                self.add_column(key.to_string(), None);
            }
        }
        let mut row = vec![None; self.columns.len()];
        for (key, value) in record.iter() {
            if let Some(idx) = self.columns.get_index_of(key) {
                row[idx] = value.map(str::to_string);
            }
        }
        self.rows.push(row);
    }

    fn add_column(&mut self, name: String, fill: Option<String>) {
        self.columns.insert(name);
        for row in &mut self.rows {
            row.push(fill.clone());
        }
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the table has a column named `name`.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over the rows.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(|cells| Row {
            columns: &self.columns,
            cells,
        })
    }

    /// Returns the non-null value at `row` in column `name`.
    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let idx = self.columns.get_index_of(name)?;
        self.rows.get(row)?[idx].as_deref()
    }

    /// Returns the cells of column `name`, or `None` if it does not exist.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = Option<&str>>> {
        let idx = self.columns.get_index_of(name)?;
        Some(self.rows.iter().map(move |row| row[idx].as_deref()))
    }

    /// Removes column `name`. Returns `true` if it existed.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some((idx, _)) = self.columns.shift_remove_full(name) else {
            return false;
        };
        for row in &mut self.rows {
            row.remove(idx);
        }
        true
    }

    /// Adds a column holding `value` in every row, unless a column with that
    /// name already exists. Returns `true` if the column was added.
    pub fn add_constant_column(&mut self, name: &str, value: Option<String>) -> bool {
        if self.columns.contains(name) {
            return false;
        }
        self.add_column(name.to_string(), value);
        true
    }

    /// Concatenates tables row-wise over the union of their columns.
    pub fn concat(tables: impl IntoIterator<Item = Table>) -> Table {
        let mut out = Table::new();
        for table in tables {
            out.append(table);
        }
        out
    }

    /// Appends all rows of `other`, adding any unseen columns.
    pub fn append(&mut self, other: Table) {
        for name in &other.columns {
            if !self.columns.contains(name) {
                self.add_column(name.clone(), None);
            }
        }
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .filter_map(|name| self.columns.get_index_of(name))
            .collect();
        for cells in other.rows {
            let mut row = vec![None; self.columns.len()];
            for (src, value) in cells.into_iter().enumerate() {
                row[mapping[src]] = value;
            }
            self.rows.push(row);
        }
    }

    /// Returns a new table with the rows for which `keep` returns `true`.
    pub fn filter(&self, mut keep: impl FnMut(&Row<'_>) -> bool) -> Table {
        let rows = self
            .rows()
            .filter(|row| keep(row))
            .map(|row| row.cells.to_vec())
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Distinct non-null values of column `name`, in first-seen order.
    pub fn unique(&self, name: &str) -> Vec<String> {
        let Some(cells) = self.column(name) else {
            return Vec::new();
        };
        let mut seen = IndexSet::new();
        for value in cells.flatten() {
            seen.insert(value.to_string());
        }
        seen.into_iter().collect()
    }

    /// Converts the table back into one record per row. Null cells are kept.
    pub fn to_records(&self) -> Vec<FlatRecord> {
        self.rows()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row.cells)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .collect()
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.columns.iter().eq(other.columns.iter()) && self.rows == other.rows
    }
}

impl Eq for Table {}
