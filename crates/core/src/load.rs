//! CSV loading. One UTF-8 (or near-UTF-8) file per analysis run; the
//! scraping side guarantees nothing beyond "a CSV at a known path".

use std::io::Read;
use std::path::Path;

use crate::error::CoreError;
use crate::model::RawTable;

/// Read a file as UTF-8, falling back to Windows-1252 for the occasional
/// Excel-resaved export.
pub fn read_file_as_utf8(path: &Path) -> Result<String, CoreError> {
    let mut file = std::fs::File::open(path).map_err(|e| CoreError::Io(e.to_string()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| CoreError::Io(e.to_string()))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Parse CSV text into a raw positional table. Scrape output is ragged,
/// so rows are read flexibly; `has_header` discards the leading row (its
/// labels are junk and are never used for naming).
pub fn parse_csv(content: &str, has_header: bool) -> Result<RawTable, CoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| CoreError::Csv(e.to_string()))?;
        rows.push(record.iter().map(|f| f.to_string()).collect());
    }

    if has_header && !rows.is_empty() {
        rows.remove(0);
    }

    Ok(RawTable { rows })
}

/// Read and parse one scrape export.
pub fn load_table(path: &Path, has_header: bool) -> Result<RawTable, CoreError> {
    let content = read_file_as_utf8(path)?;
    parse_csv(&content, has_header)
}
