// src/importer/reader.rs

use anyhow::{Context, Result};
use csv::{Reader, ReaderBuilder, StringRecord};
use std::{fs::File, path::Path};

use crate::{airtable::Record, source::DataSource};

fn open(path: &Path) -> Result<Reader<File>> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening CSV {}", path.display()))
}

/// Column names from the first row of `path`. Data rows are not read.
pub fn read_header(path: &Path) -> Result<Vec<String>> {
    let mut rdr = open(path)?;
    let headers = rdr
        .headers()
        .with_context(|| format!("reading CSV header of {}", path.display()))?;
    Ok(headers.iter().map(str::to_string).collect())
}

/// Header columns the source allows, in header order.
pub fn allowed_header_columns(header: &[String], source: &DataSource) -> Vec<String> {
    header
        .iter()
        .filter(|column| source.allows(column))
        .cloned()
        .collect()
}

/// Keep only the allowed cells of `row`. Cells past the end of a short row
/// are left out rather than defaulted.
fn project(header: &StringRecord, row: &StringRecord, source: &DataSource) -> Record {
    header
        .iter()
        .zip(row.iter())
        .filter(|(column, _)| source.allows(column))
        .collect()
}

/// Read every data row of `path`, projected to the source's columns, in file order.
pub fn read_filtered_records(path: &Path, source: &DataSource) -> Result<Vec<Record>> {
    let mut rdr = open(path)?;
    let header = rdr
        .headers()
        .with_context(|| format!("reading CSV header of {}", path.display()))?
        .clone();

    let mut records = Vec::new();
    for (i, row) in rdr.records().enumerate() {
        // +2: 1-based, and the header is line 1
        let row = row.with_context(|| format!("parsing {} row {}", path.display(), i + 2))?;
        records.push(project(&header, &row, source));
    }
    Ok(records)
}
