//! Raw tabular record set and CSV ingestion.

use crate::error::{DataError, DataResult};
use std::path::Path;

/// Delimiters considered when sniffing a CSV file.
const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// An untyped table: header row plus string cells.
///
/// Cells are kept as raw text; numeric parsing happens during preprocessing
/// so that one bad cell drops one row instead of failing the whole load.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Read a UTF-8 CSV file with a header row, auto-detecting the delimiter.
    pub fn read_csv(path: &Path) -> DataResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::read_csv_str(&content)
    }

    /// Parse CSV text with a header row, auto-detecting the delimiter.
    pub fn read_csv_str(content: &str) -> DataResult<Self> {
        let header_line = content.lines().next().ok_or(DataError::MissingHeader)?;
        let delimiter = sniff_delimiter(header_line);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.is_empty() {
            return Err(DataError::MissingHeader);
        }

        let width = headers.len();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            // Short records are padded so row filtering sees missing cells,
            // long records are truncated to the header width.
            cells.resize(width, String::new());
            rows.push(cells);
        }

        Ok(Self::new(headers, rows))
    }
}

/// Pick the candidate delimiter occurring most often in the header line.
/// Ties go to the earlier candidate, so `,` wins over `;` by default.
fn sniff_delimiter(header_line: &str) -> u8 {
    let mut best = CANDIDATE_DELIMITERS[0];
    let mut best_count = 0usize;
    for &cand in &CANDIDATE_DELIMITERS {
        let count = header_line.bytes().filter(|&b| b == cand).count();
        if count > best_count {
            best = cand;
            best_count = count;
        }
    }
    best
}
