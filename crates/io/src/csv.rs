// CSV/TSV plan tables

use std::collections::BTreeMap;
use std::path::Path;

use stainplan_core::{RawRow, RawTable};

use crate::error::LoadError;

/// Read a delimited file into a positional table.
///
/// With `delimiter = None` the delimiter is sniffed from the first lines.
/// Rows carry the file line they start on; ragged rows are allowed.
pub fn read_delimited(path: &Path, delimiter: Option<u8>) -> Result<RawTable, LoadError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = delimiter.unwrap_or_else(|| sniff_delimiter(&content));
    log::debug!("reading {} with delimiter {:?}", path.display(), delimiter as char);
    parse_delimited(&content, delimiter).map_err(|message| LoadError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse delimited text already in memory.
pub fn parse_delimited(content: &str, delimiter: u8) -> Result<RawTable, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let bytes = content.as_bytes();
    let mut table = RawTable::default();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| e.to_string())?;
        let line = match record.position() {
            Some(pos) => record_start_line(bytes, pos.byte() as usize, pos.line() as usize),
            None => row_idx + 1,
        };
        table.push(RawRow::new(line, record.iter().map(Some)));
    }
    Ok(table)
}

/// Line on which a record starts.
///
/// The csv reader skips empty lines silently and reports a record's position
/// as the point where it started reading, before those lines.
fn record_start_line(bytes: &[u8], offset: usize, line: usize) -> usize {
    let skipped = bytes
        .get(offset..)
        .unwrap_or_default()
        .iter()
        .take_while(|&&b| b == b'\n' || b == b'\r')
        .filter(|&&b| b == b'\n')
        .count();
    line + skipped
}

const SNIFF_CANDIDATES: [u8; 4] = [b'\t', b';', b',', b'|'];
const SNIFF_LINES: usize = 10;

/// Pick the delimiter that splits the sample into the widest consistent rows.
///
/// Plan exports often open with a title or note cell before the header, so
/// the first line alone is not trusted. Each candidate is scored on its modal
/// field count over the first non-blank lines (rows at that width times the
/// width); a modal width of 1 never wins and ties go to the earlier candidate.
pub fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut best: Option<(u8, usize)> = None;
    for delimiter in SNIFF_CANDIDATES {
        let Some(score) = sniff_score(&sample, delimiter) else {
            continue;
        };
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((delimiter, score));
        }
    }
    best.map(|(delimiter, _)| delimiter).unwrap_or(b',')
}

fn sniff_score(sample: &[&str], delimiter: u8) -> Option<usize> {
    let mut widths: BTreeMap<usize, usize> = BTreeMap::new();
    for line in sample {
        *widths.entry(field_count(line, delimiter)).or_default() += 1;
    }
    widths
        .into_iter()
        .filter(|&(width, _)| width > 1)
        .max_by_key(|&(width, rows)| (rows, width))
        .map(|(width, rows)| width * rows)
}

fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(Result::ok)
        .map_or(1, |record| record.len())
}

/// Read file and convert to UTF-8 if needed (Excel exports are often Windows-1252).
///
/// A leading byte-order mark is dropped.
pub fn read_file_as_utf8(path: &Path) -> Result<String, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound(path.to_path_buf())
        } else {
            LoadError::Io { path: path.to_path_buf(), source }
        }
    })?;

    let text = match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            log::info!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };

    Ok(match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    })
}
