//! Spreadsheet loading.
//!
//! The first worksheet of a workbook is read into a [`Table`]: the first row
//! of the used range becomes the header, every following non-blank row a data
//! row. Any format calamine understands (xlsx, xlsm, xlsb, xls, ods) works.

use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::{NaiveDateTime, NaiveTime};
use tracing::debug;

use crate::error::{Error, Result};

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// No value.
    Empty,
    /// Text.
    Text(String),
    /// Any numeric value, integer or float.
    Number(f64),
    /// Boolean.
    Bool(bool),
    /// Date or date-time.
    Date(NaiveDateTime),
}

impl Cell {
    /// Check if the cell holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Read the cell as a number.
    ///
    /// Numeric cells are returned as-is and text is parsed after trimming.
    /// Everything else is not a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Self::Empty | Self::Bool(_) | Self::Date(_) => None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty => Self::Empty,
            Data::String(s) if s.is_empty() => Self::Empty,
            Data::String(s) | Data::DurationIso(s) => Self::Text(s.clone()),
            Data::Float(f) => Self::Number(*f),
            Data::Int(i) => Self::Number(*i as f64),
            Data::Bool(b) => Self::Bool(*b),
            Data::DateTime(_) | Data::DateTimeIso(_) => data
                .as_datetime()
                .map_or_else(|| Self::Text(data.to_string()), Self::Date),
            Data::Error(e) => Self::Text(e.to_string()),
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{n:.0}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Date(d) if d.time() == NaiveTime::MIN => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// A header row plus data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create a table from a header and rows.
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { headers, rows }
    }

    /// Load the first worksheet of a spreadsheet file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if the file cannot be opened as a workbook or
    /// has no worksheet.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut workbook =
            open_workbook_auto(path).map_err(|e| Error::parse(path, e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| Error::parse(path, "workbook has no worksheets"))?
            .map_err(|e| Error::parse(path, e.to_string()))?;

        let mut rows = range.rows();
        let headers = rows
            .next()
            .map(|header| header.iter().map(ToString::to_string).collect())
            .unwrap_or_default();

        let rows: Vec<Vec<Cell>> = rows
            .map(|row| row.iter().map(Cell::from_data).collect::<Vec<_>>())
            .filter(|row| !row.iter().all(Cell::is_empty))
            .collect();

        debug!(
            path = %path.display(),
            rows = rows.len(),
            "Loaded worksheet"
        );
        Ok(Self::new(headers, rows))
    }

    /// Column names, in sheet order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if there are no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column with exactly this name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at a row and column; missing cells read as empty.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        const EMPTY: &Cell = &Cell::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(EMPTY)
    }
}

/// Write an `.xlsx` workbook for tests.
///
/// The first row is written as text; later cells that parse as numbers are
/// written as numbers. An empty row slice leaves that sheet row blank.
#[cfg(test)]
pub fn xlsx_bytes(rows: &[&[&str]]) -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        let r = u32::try_from(r).unwrap();
        for (c, value) in row.iter().enumerate() {
            let c = u16::try_from(c).unwrap();
            match value.parse::<f64>() {
                Ok(n) if r > 0 => sheet.write_number(r, c, n).unwrap(),
                _ => sheet.write_string(r, c, *value).unwrap(),
            };
        }
    }
    workbook.save_to_buffer().unwrap()
}
