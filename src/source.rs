// src/source.rs

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::error::ImportError;

/// A named CSV export format and the columns worth importing from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

impl DataSource {
    pub fn allows(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }
}

/// NatWest bank statement export. Only these columns are needed.
const NATWEST: DataSource = DataSource {
    name: "natwest",
    columns: &["Date", "Description", "Value"],
};

/// All known sources keyed by name. New formats only need an entry here.
static DATA_SOURCES: Lazy<HashMap<&'static str, DataSource>> = Lazy::new(|| {
    [NATWEST]
        .into_iter()
        .map(|source| (source.name, source))
        .collect()
});

/// Look up a data source by its exact (case-sensitive) name.
pub fn resolve(name: &str) -> Result<&'static DataSource, ImportError> {
    DATA_SOURCES
        .get(name)
        .ok_or_else(|| ImportError::UnsupportedDataSource {
            name: name.to_string(),
            known: known_names(),
        })
}

/// Names accepted by [`resolve`], sorted.
pub fn known_names() -> Vec<&'static str> {
    let mut names: Vec<_> = DATA_SOURCES.keys().copied().collect();
    names.sort_unstable();
    names
}
