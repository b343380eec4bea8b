// src/airtable/mod.rs

pub mod client;

use anyhow::Result;
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};

pub use client::AirtableClient;

/// A table that exists in a base, either found by name or freshly created.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TableHandle {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    SingleLineText,
}

/// A field definition sent when creating a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
}

impl FieldSpec {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: FieldType::SingleLineText,
        }
    }
}

/// One row's cell values keyed by column name, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    cells: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `column` to `value`, replacing any earlier value for that column.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(c, _)| *c == column) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(c, _)| c.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, value) in &self.cells {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// The three remote operations an import needs.
pub trait TableService {
    /// All tables currently in `base_id`.
    fn list_tables(&self, base_id: &str) -> Result<Vec<TableHandle>>;

    /// Create `name` in `base_id` with exactly `fields`.
    fn create_table(&self, base_id: &str, name: &str, fields: &[FieldSpec]) -> Result<TableHandle>;

    /// Append `records` to `table` in order. Returns how many were created.
    fn batch_create(&self, base_id: &str, table: &TableHandle, records: &[Record]) -> Result<usize>;
}

impl<T: TableService + ?Sized> TableService for &T {
    fn list_tables(&self, base_id: &str) -> Result<Vec<TableHandle>> {
        (**self).list_tables(base_id)
    }

    fn create_table(&self, base_id: &str, name: &str, fields: &[FieldSpec]) -> Result<TableHandle> {
        (**self).create_table(base_id, name, fields)
    }

    fn batch_create(&self, base_id: &str, table: &TableHandle, records: &[Record]) -> Result<usize> {
        (**self).batch_create(base_id, table, records)
    }
}
