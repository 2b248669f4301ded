// ==============================================================================
// table.rs - Tabular Batch Reader
// ==============================================================================
// Description: Parses uploaded CSV/TSV batches into typed cells
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================
// Format: delimited text with a header row
// Example:
//   Father_Gene,Father_Variant,...,Child_Genotype
//   BRCA1,c.68_69delAG,...,1
//
// Cell typing is inferred per value:
//   ""        → Empty (also "NA", "N/A", "NULL", "None", "nan", ...)
//   "1"       → Integer(1)
//   "1.5"     → Float(1.5)
//   "BRCA1"   → Text("BRCA1")
// Gzip-compressed input is detected by magic number and decompressed
// (all members, so concatenated and bgzip files read completely). The
// decompressed size is capped so a small upload cannot expand without bound.
// ==============================================================================

use csv::ReaderBuilder;
use flate2::read::MultiGzDecoder;
use std::borrow::Cow;
use std::io::Read;
use thiserror::Error;

/// Gzip magic number (deflate method)
const GZIP_MAGIC: [u8; 3] = [0x1f, 0x8b, 0x08];

/// Default cap on the (decompressed) input size: 256 MB
pub const DEFAULT_MAX_INPUT_BYTES: u64 = 256 * 1024 * 1024;

/// Tokens read as missing values
const MISSING_TOKENS: [&str; 19] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null", "",
];

/// Errors that can occur while reading a tabular batch
#[derive(Error, Debug)]
pub enum TableError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("No columns to parse from file")]
    NoColumns,

    #[error("Expected {expected} fields in line {line}, saw {found}")]
    TooManyFields {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Input exceeds {limit} bytes once decompressed")]
    InputTooLarge { limit: u64 },
}

/// One tabular value with its inferred type
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Infer the cell type from raw text
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if MISSING_TOKENS.contains(&trimmed) {
            return Cell::Empty;
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            return Cell::Integer(value);
        }
        if let Ok(value) = trimmed.parse::<f64>() {
            return Cell::Float(value);
        }
        Cell::Text(raw.to_string())
    }

    /// String form used for category lookups
    ///
    /// Integers print without a decimal point, integral floats keep one
    /// trailing `.0`, missing values print as `nan`.
    pub fn category_form(&self) -> Cow<'_, str> {
        match self {
            Cell::Empty => Cow::Borrowed("nan"),
            Cell::Integer(v) => Cow::Owned(v.to_string()),
            Cell::Float(v) if v.is_nan() => Cow::Borrowed("nan"),
            Cell::Float(v) if v.is_infinite() => {
                Cow::Borrowed(if *v > 0.0 { "inf" } else { "-inf" })
            }
            Cell::Float(v) if v.fract() == 0.0 && v.abs() < 1e16 => {
                Cow::Owned(format!("{:.1}", v))
            }
            Cell::Float(v) => Cow::Owned(v.to_string()),
            Cell::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }

    /// Numeric value for pass-through feature columns
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Integer(v) => Some(*v as f64),
            Cell::Float(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    /// Integer value for display (floats truncate toward zero)
    pub fn as_display_int(&self) -> Option<i64> {
        match self {
            Cell::Integer(v) => Some(*v),
            Cell::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            Cell::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.category_form())
    }
}

/// Parsed tabular batch: named columns, zero or more rows
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table from already-typed rows
    ///
    /// Short rows are padded with `Cell::Empty`; rows wider than the header
    /// are rejected.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, TableError> {
        if headers.is_empty() {
            return Err(TableError::NoColumns);
        }

        let width = headers.len();
        let mut padded = Vec::with_capacity(rows.len());
        for (idx, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(TableError::TooManyFields {
                    line: idx as u64 + 2, // Line 1 is the header
                    expected: width,
                    found: row.len(),
                });
            }
            row.resize(width, Cell::Empty);
            padded.push(row);
        }

        Ok(Self {
            headers,
            rows: padded,
        })
    }

    /// Build a table from raw text values (types inferred per cell)
    pub fn from_text_rows(headers: &[&str], rows: &[Vec<&str>]) -> Result<Self, TableError> {
        Self::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|row| row.iter().map(|v| Cell::infer(v)).collect())
                .collect(),
        )
    }

    /// Parse an uploaded file, decompressing gzip content when detected
    pub fn from_bytes(data: &[u8], delimiter: u8) -> Result<Self, TableError> {
        Self::from_bytes_limited(data, delimiter, DEFAULT_MAX_INPUT_BYTES)
    }

    /// Parse an uploaded file, rejecting content larger than `max_bytes`
    /// after decompression
    pub fn from_bytes_limited(
        data: &[u8],
        delimiter: u8,
        max_bytes: u64,
    ) -> Result<Self, TableError> {
        if !data.starts_with(&GZIP_MAGIC) {
            if data.len() as u64 > max_bytes {
                return Err(TableError::InputTooLarge { limit: max_bytes });
            }
            return Self::from_reader(data, delimiter);
        }

        // Read one byte past the cap to tell "exactly at" from "over"
        let mut decompressed = Vec::new();
        MultiGzDecoder::new(data)
            .take(max_bytes.saturating_add(1))
            .read_to_end(&mut decompressed)?;
        if decompressed.len() as u64 > max_bytes {
            return Err(TableError::InputTooLarge { limit: max_bytes });
        }

        Self::from_reader(decompressed.as_slice(), delimiter)
    }

    /// Parse delimited text with a header row
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self, TableError> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
            return Err(TableError::NoColumns);
        }

        let width = headers.len();
        let mut rows = Vec::new();

        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            if record.len() > width {
                let line = record
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(idx as u64 + 2);
                return Err(TableError::TooManyFields {
                    line,
                    expected: width,
                    found: record.len(),
                });
            }

            let mut row: Vec<Cell> = record.iter().map(Cell::infer).collect();
            row.resize(width, Cell::Empty);
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Index of the first column named `name`
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at (`row`, `column`)
    pub fn cell(&self, row: usize, column: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(column))
    }
}
