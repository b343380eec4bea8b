pub mod airtable;
pub mod config;
pub mod error;
pub mod ids;
pub mod importer;
pub mod source;
