//! Raw loader for the comma-delimited input file
//!
//! The format has no quoting: every line is split on `,` as-is, so a value
//! containing a comma shifts the remaining fields. Rows whose field count
//! does not match the header are rejected. Empty lines are skipped.

use super::{LoadError, LoadResult, RawRecord, TestingRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Read a file and return one record per data line
pub fn load_raw(path: impl AsRef<Path>) -> LoadResult<Vec<RawRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = read_raw(file)?;
    info!(path = %path.display(), rows = records.len(), "loaded raw rows");
    Ok(records)
}

/// Parse in-memory text; the first line is the header
pub fn parse_raw(text: &str) -> LoadResult<Vec<RawRecord>> {
    read_raw(text.as_bytes())
}

fn read_raw<R: Read>(input: R) -> LoadResult<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .quoting(false)
        .flexible(false)
        .trim(csv::Trim::All)
        .from_reader(input);

    let header = reader.headers().map_err(csv_error)?.clone();
    if header.iter().all(str::is_empty) {
        return Err(LoadError::MissingHeader);
    }
    debug!(columns = header.len(), "read header");

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(csv_error)?;
        records.push(header.iter().zip(row.iter()).collect());
    }
    Ok(records)
}

fn csv_error(err: csv::Error) -> LoadError {
    if let csv::ErrorKind::UnequalLengths {
        pos,
        expected_len,
        len,
    } = err.kind()
    {
        return LoadError::FieldCount {
            line: pos.as_ref().map_or(0, |p| p.line() as usize),
            expected: *expected_len as usize,
            found: *len as usize,
        };
    }
    LoadError::Csv(err)
}

/// Load and type every row; the first row that cannot be typed aborts
pub fn load_records(path: impl AsRef<Path>) -> LoadResult<Vec<TestingRecord>> {
    load_raw(path)?.iter().map(TestingRecord::from_raw).collect()
}
