//! Tabular record source
//!
//! Reads a delimited text file with a header row into `RawRecord`s in file
//! order. Header names are kept verbatim (case-sensitive) apart from
//! surrounding whitespace and a leading UTF-8 BOM.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::SourceError;
use crate::models::RawRecord;

pub const DEFAULT_DELIMITER: u8 = b',';

const UTF8_BOM: char = '\u{feff}';

/// Streaming reader over a CSV file
pub struct CsvSource {
    path: PathBuf,
    reader: csv::Reader<File>,
    headers: Vec<String>,
    next_index: usize,
}

impl CsvSource {
    /// Open `path` and read its header row
    pub fn open(path: &Path, delimiter: u8) -> Result<Self, SourceError> {
        let file = File::open(path).map_err(|source| SourceError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches(UTF8_BOM).trim().to_string())
            .collect();

        tracing::debug!(path = %path.display(), columns = ?headers, "Opened record source");

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            headers,
            next_index: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Read every remaining record; the first malformed row aborts
    pub fn read_all(self) -> Result<Vec<RawRecord>, SourceError> {
        self.collect()
    }
}

impl Iterator for CsvSource {
    type Item = Result<RawRecord, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut row = csv::StringRecord::new();
        match self.reader.read_record(&mut row) {
            Ok(false) => None,
            Err(e) => Some(Err(e.into())),
            Ok(true) => {
                // Header is line 1; quoted multi-line cells push later rows down
                let line_number = row
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(self.next_index + 2);
                self.next_index += 1;

                let mut record = RawRecord::new(line_number);
                for (name, value) in self.headers.iter().zip(row.iter()) {
                    if !name.is_empty() {
                        record.insert(name.clone(), value);
                    }
                }
                Some(Ok(record))
            }
        }
    }
}

/// Parse a single-character delimiter setting ("," ";" "\t" "|" ...)
pub fn parse_delimiter(value: &str) -> Option<u8> {
    match value {
        "\\t" | "tab" => Some(b'\t'),
        _ => {
            let mut chars = value.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() && c != '"' && c != '\n' && c != '\r' => Some(c as u8),
                _ => None,
            }
        }
    }
}
