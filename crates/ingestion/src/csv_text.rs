//! Splitting pasted/exported text into header and data rows.
//!
//! Records are read with the `csv` crate, so double-quoted cells may hold
//! commas and line breaks. Each cell is trimmed and stripped of surrounding
//! single or double quotes.

use csv::{ReaderBuilder, StringRecord, Trim};
use journal_core::{Error, RawRow, Result};

/// Header line and data rows of one import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedText {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    /// Data lines dropped for having fewer than two cells.
    pub short_lines: usize,
    /// Data lines beyond the row cap.
    pub truncated: usize,
}

fn clean_cell(cell: &str) -> String {
    let cell = cell.trim();
    let cell = cell
        .strip_prefix('"')
        .and_then(|c| c.strip_suffix('"'))
        .or_else(|| cell.strip_prefix('\'').and_then(|c| c.strip_suffix('\'')))
        .unwrap_or(cell);
    cell.trim().to_string()
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|cell| cell.trim().is_empty()) && record.len() <= 1
}

/// 1-based line a record starts on. The reader may report the position of
/// blank lines it skipped before the record, so those are counted forward.
fn record_line(text: &str, record: &StringRecord) -> usize {
    let Some(position) = record.position() else {
        return 0;
    };
    let skipped = usize::try_from(position.byte())
        .ok()
        .and_then(|start| text.get(start..))
        .map_or(0, |rest| {
            rest.bytes()
                .take_while(|b| matches!(b, b'\r' | b'\n'))
                .filter(|&b| b == b'\n')
                .count()
        });
    position.line() as usize + skipped
}

/// Split text into headers and at most `max_rows` data rows.
///
/// Fails with a structural error when there is no header line or no data line.
pub fn parse_text(text: &str, max_rows: usize) -> Result<ParsedText> {
    let text = text.trim_start_matches('\u{feff}');
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut records = reader.records().filter_map(|record| match record {
        Ok(record) if is_blank(&record) => None,
        other => Some(other),
    });

    let headers: Vec<String> = match records.next() {
        Some(record) => record
            .map_err(|e| Error::structural(format!("unreadable header line: {e}")))?
            .iter()
            .map(clean_cell)
            .collect(),
        None => return Err(Error::structural("input is empty")),
    };
    if headers.iter().all(|h| h.is_empty()) {
        return Err(Error::structural("header line has no column names"));
    }

    let mut rows = Vec::new();
    let mut short_lines = 0;
    let mut truncated = 0;
    let mut data_lines = 0;

    for record in records {
        let record = record.map_err(|e| Error::structural(format!("unreadable data line: {e}")))?;
        data_lines += 1;
        if record.len() < 2 {
            short_lines += 1;
            continue;
        }
        if rows.len() >= max_rows {
            truncated += 1;
            continue;
        }
        let line = record_line(text, &record);
        rows.push(RawRow::new(line, record.iter().map(clean_cell).collect()));
    }

    if data_lines == 0 {
        return Err(Error::structural(
            "file must contain a header line and at least one data row",
        ));
    }

    Ok(ParsedText {
        headers,
        rows,
        short_lines,
        truncated,
    })
}
