// src/error.rs

use thiserror::Error;

/// Failures the importer knows how to name. Everything else (I/O, CSV
/// parsing, transport) travels as a plain `anyhow::Error` with context.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("{0} not found in .env file")]
    MissingApiKey(&'static str),

    #[error("Unsupported data source: {name} (expected one of: {})", .known.join(", "))]
    UnsupportedDataSource {
        name: String,
        known: Vec<&'static str>,
    },

    /// Fewer than three `/`-separated segments.
    #[error("Malformed Airtable URL (expected .../<base>/<table>/<view>): {0}")]
    MalformedUrl(String),

    #[error("Airtable returned {status}: {body}")]
    Remote { status: u16, body: String },
}
