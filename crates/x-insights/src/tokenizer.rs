//! CSV tokenizing into header-labeled raw rows.
//!
//! The tokenizer never fails: malformed records, invalid UTF-8 and even an
//! unreadable source are reported through [`ParsedCsv::errors`] so the caller
//! can turn them into diagnostics.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};
use serde::Serialize;
use tracing::{debug, warn};

use crate::utils::format_count;

/// Maximum number of parse errors listed individually.
pub const MAX_ITEMIZED_ERRORS: usize = 25;

const BYTE_ORDER_MARK: char = '\u{feff}';

/// One data record, cells in header order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRow(Vec<String>);

impl RawRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self(cells)
    }

    /// Cell at `index`, or `None` when the record is shorter than the header.
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Output of one tokenizer run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedCsv {
    /// Non-empty data rows, in file order.
    pub rows: Vec<RawRow>,
    /// Header names, made unique.
    pub fields: Vec<String>,
    pub errors: Vec<String>,
    /// Number of rows kept; equals `rows.len()`.
    pub row_count: usize,
    /// Set when the row ceiling stopped parsing early.
    pub truncated: bool,
}

impl ParsedCsv {
    /// An empty result carrying a single error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
            ..Self::default()
        }
    }

    /// Position of the header named exactly `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }
}

/// Streams CSV sources into [`ParsedCsv`] values.
///
/// # Example
///
/// ```rust,ignore
/// use x_insights::tokenizer::CsvTokenizer;
///
/// let parsed = CsvTokenizer::new().with_max_rows(1_000).parse_path("content.csv".as_ref());
/// println!("{} rows, {} errors", parsed.row_count, parsed.errors.len());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvTokenizer {
    max_rows: Option<usize>,
}

impl CsvTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop parsing once this many data rows were kept.
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn max_rows(&self) -> Option<usize> {
        self.max_rows
    }

    /// Tokenize a file on disk.
    pub fn parse_path(&self, path: &Path) -> ParsedCsv {
        match File::open(path) {
            Ok(file) => self.parse_reader(file),
            Err(e) => {
                warn!("Could not open {}: {}", path.display(), e);
                ParsedCsv::failed(format!("Could not read file: {e}"))
            }
        }
    }

    /// Tokenize an in-memory buffer.
    pub fn parse_bytes(&self, bytes: &[u8]) -> ParsedCsv {
        self.parse_reader(bytes)
    }

    /// Tokenize any byte source.
    pub fn parse_reader<R: Read>(&self, reader: R) -> ParsedCsv {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut errors = ErrorLog::default();
        let mut fields: Option<Vec<String>> = None;
        let mut rows = Vec::new();
        let mut truncated = false;
        let mut record = ByteRecord::new();

        loop {
            match reader.read_byte_record(&mut record) {
                Ok(false) => break,
                Ok(true) => {}
                Err(e) if e.is_io_error() => {
                    warn!("CSV read failed: {}", e);
                    return ParsedCsv::failed(format!("Could not read file: {e}"));
                }
                Err(e) => {
                    errors.push(e.to_string());
                    continue;
                }
            }

            let line = record.position().map_or(0, |p| p.line());
            let cells = decode_record(&record, line, &mut errors);
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }

            if fields.is_none() {
                fields = Some(unique_headers(cells));
                continue;
            }
            let header_len = fields.as_ref().map_or(0, Vec::len);

            if self.max_rows.is_some_and(|max| rows.len() >= max) {
                truncated = true;
                break;
            }

            if cells.len() != header_len {
                let kind = if cells.len() > header_len {
                    "Too many fields"
                } else {
                    "Too few fields"
                };
                errors.push(format!(
                    "Line {line}: {kind}: expected {header_len} fields but parsed {}",
                    cells.len()
                ));
            }

            rows.push(RawRow(cells));
        }

        let mut errors = errors.finish();
        if truncated {
            warn!("Row limit reached after {} rows", rows.len());
            errors.push(format!(
                "Row limit reached. Only the first {} rows were kept.",
                format_count(rows.len())
            ));
        }

        let fields = fields.unwrap_or_default();
        debug!(
            "Tokenized {} rows across {} columns ({} errors)",
            rows.len(),
            fields.len(),
            errors.len()
        );

        ParsedCsv {
            row_count: rows.len(),
            rows,
            fields,
            errors,
            truncated,
        }
    }
}

/// Collects parse errors, itemizing only the first few.
#[derive(Debug, Default)]
struct ErrorLog {
    itemized: Vec<String>,
    overflow: usize,
}

impl ErrorLog {
    fn push(&mut self, message: String) {
        if self.itemized.len() < MAX_ITEMIZED_ERRORS {
            self.itemized.push(message);
        } else {
            self.overflow += 1;
        }
    }

    fn finish(mut self) -> Vec<String> {
        if self.overflow > 0 {
            self.itemized
                .push(format!("{} more parse error(s) were not listed.", self.overflow));
        }
        self.itemized
    }
}

fn decode_record(record: &ByteRecord, line: u64, errors: &mut ErrorLog) -> Vec<String> {
    let mut reported = false;
    record
        .iter()
        .map(|bytes| match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => {
                if !reported {
                    errors.push(format!("Line {line}: Invalid UTF-8 sequence"));
                    reported = true;
                }
                String::from_utf8_lossy(bytes).into_owned()
            }
        })
        .collect()
}

/// Strip a leading byte-order mark and suffix repeated names with `_1`, `_2`, ...
fn unique_headers(mut cells: Vec<String>) -> Vec<String> {
    if let Some(first) = cells.first_mut()
        && first.starts_with(BYTE_ORDER_MARK)
    {
        first.drain(..BYTE_ORDER_MARK.len_utf8());
    }

    let mut seen: Vec<String> = Vec::with_capacity(cells.len());
    for cell in cells {
        let base = cell.trim().to_string();
        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        seen.push(name);
    }
    seen
}
