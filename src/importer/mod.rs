// src/importer/mod.rs

pub mod reader;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::{
    airtable::{FieldSpec, TableHandle, TableService},
    ids::AirtableIds,
    source::DataSource,
};

/// Outcome of one import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub table: TableHandle,
    pub created_table: bool,
    pub records: usize,
}

/// Provisions the destination table and uploads one CSV file into it.
pub struct Importer<S> {
    service: S,
    ids: AirtableIds,
    source: &'static DataSource,
}

impl<S: TableService> Importer<S> {
    pub fn new(service: S, ids: AirtableIds, source: &'static DataSource) -> Self {
        Self {
            service,
            ids,
            source,
        }
    }

    /// Find `table_name` in the base, or create it from the CSV header.
    ///
    /// An existing table is reused as-is; its fields are not compared with
    /// the CSV. A new table gets one single-line-text field per allowed
    /// header column, in header order. Lookup and creation are two separate
    /// calls, so two concurrent runs can both create the table.
    #[instrument(level = "info", skip(self, csv_path), fields(base = %self.ids.base_id))]
    pub fn provision_table(&self, table_name: &str, csv_path: &Path) -> Result<(TableHandle, bool)> {
        let tables = self
            .service
            .list_tables(&self.ids.base_id)
            .with_context(|| format!("listing tables in base {}", self.ids.base_id))?;

        if let Some(existing) = tables.into_iter().find(|t| t.name == table_name) {
            info!(table = %existing.id, "reusing existing table");
            return Ok((existing, false));
        }

        let header = reader::read_header(csv_path)?;
        let fields: Vec<FieldSpec> = reader::allowed_header_columns(&header, self.source)
            .into_iter()
            .map(FieldSpec::text)
            .collect();
        if fields.is_empty() {
            warn!(
                csv = %csv_path.display(),
                source = self.source.name,
                "no allowed columns in CSV header; creating table with no fields"
            );
        }

        let table = self
            .service
            .create_table(&self.ids.base_id, table_name, &fields)
            .with_context(|| format!("creating table {:?}", table_name))?;
        info!(table = %table.id, n_fields = fields.len(), "created table");
        Ok((table, true))
    }

    /// Send every CSV row, filtered to the allowed columns, in one batch.
    #[instrument(level = "info", skip(self, table, csv_path), fields(table = %table.id))]
    pub fn upload(&self, table: &TableHandle, csv_path: &Path) -> Result<usize> {
        let records = reader::read_filtered_records(csv_path, self.source)?;
        info!(n = records.len(), "uploading records");

        self.service
            .batch_create(&self.ids.base_id, table, &records)
            .with_context(|| format!("uploading {} records to {}", records.len(), table.name))
    }

    pub fn run(&self, table_name: &str, csv_path: &Path) -> Result<ImportSummary> {
        let (table, created_table) = self.provision_table(table_name, csv_path)?;
        let records = self.upload(&table, csv_path)?;
        Ok(ImportSummary {
            table,
            created_table,
            records,
        })
    }

    /// The line printed after a successful run.
    pub fn confirmation(&self, csv_path: &Path) -> String {
        format!(
            "CSV file '{}' uploaded to Airtable base '{}', table '{}'",
            csv_path.display(),
            self.ids.base_id,
            self.ids.table_id
        )
    }
}
