//! Reading raw transaction rows from CSV.

use crate::error::{fail, ErrorType, IntoResult};
use crate::model::{schema, RawRow};
use crate::Result;
use anyhow::Context;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Reads the CSV file at `path`. See `read_csv`.
pub(crate) fn read_csv_file(path: &Path) -> Result<Vec<RawRow>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Unable to open file {}", path.display()))
        .pub_result(ErrorType::Storage)?;
    read_csv(file)
}

/// Reads one raw row per CSV record. Headers are matched case-insensitively and must include the
/// mandatory columns. Empty cells are left out so that the store fills in the column default.
pub(crate) fn read_csv<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers: Vec<String> = rdr
        .headers()
        .context("Unable to read the CSV header")
        .pub_result(ErrorType::Coercion)?
        .iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();

    for column in schema::mandatory_columns() {
        if !headers.iter().any(|h| h == column.name()) {
            fail!(
                ErrorType::MissingColumn,
                "The CSV header is missing the mandatory column '{column}'"
            );
        }
    }

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record
            .with_context(|| format!("Unable to read CSV record {}", i + 1))
            .pub_result(ErrorType::Coercion)?;
        let row: RawRow = headers
            .iter()
            .zip(record.iter())
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(h, cell)| (h.clone(), serde_json::Value::String(cell.to_string())))
            .collect();
        rows.push(row);
    }
    debug!("Read {} rows from CSV", rows.len());
    Ok(rows)
}
