//! Tabular query results.
//!
//! Decodes the comma-delimited result file the service writes into rows of
//! text fields.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A row of fields from a result file.
pub type Row = Vec<String>;

/// The decoded contents of a query result file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTable {
    /// Column names from the header row, when the file has one.
    pub columns: Option<Vec<String>>,

    /// Data rows, in file order. Rows may differ in length.
    pub rows: Vec<Row>,
}

impl ResultTable {
    /// Decodes comma-delimited text.
    ///
    /// With `has_header`, the first record becomes the column names and is
    /// not counted as a row. Quoted fields follow RFC 4180.
    pub fn from_csv(data: &[u8], has_header: bool) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(has_header)
            .flexible(true)
            .from_reader(data);

        let columns: Option<Vec<String>> = if has_header {
            Some(reader.headers()?.iter().map(str::to_string).collect())
        } else {
            None
        };

        let rows = reader
            .records()
            .map(|record| -> Result<Row> { Ok(record?.iter().map(str::to_string).collect()) })
            .collect::<Result<Vec<Row>>>()?;

        Ok(Self { columns, rows })
    }

    /// Returns the number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns: the header width, or the widest row.
    pub fn column_count(&self) -> usize {
        match &self.columns {
            Some(columns) => columns.len(),
            None => self.rows.iter().map(Vec::len).max().unwrap_or(0),
        }
    }

    /// Returns true if there are no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the position of the named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.as_ref()?.iter().position(|c| c == name)
    }

    /// Returns every value of the named column; missing cells are skipped.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let index = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| row.get(index).map(String::as_str))
                .collect(),
        )
    }
}
