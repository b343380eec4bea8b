use anyhow::{Context, Result};
use clap::Parser;
use csv2airtable::{
    airtable::AirtableClient, config::Config, ids::parse_ids_from_url, importer::Importer, source,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Upload rows from a CSV file into an Airtable table, creating the table if needed.
#[derive(Parser, Debug)]
#[command(name = "csv2airtable", version)]
struct Args {
    /// Path to the CSV file to upload
    #[arg(long, value_parser = existing_path)]
    csv_file: PathBuf,

    /// URL to the Airtable base, e.g. https://airtable.com/<base>/<table>/<view>
    #[arg(long)]
    airtable_url: String,

    /// Name of the table to create (or reuse if it already exists)
    #[arg(long)]
    table_name: String,

    /// Data source the CSV was exported from (e.g. natwest)
    #[arg(long)]
    data_source: String,
}

fn existing_path(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("Path '{}' does not exist.", raw))
    }
}

fn main() -> Result<()> {
    // ─── 1) env + logging ───────────────────────────────────────────
    // a missing .env is fine; real environment variables take precedence
    dotenv::dotenv().ok();

    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();

    // ─── 2) resolve config, source, ids (no network yet) ────────────
    let config = Config::from_env()?;
    let source = source::resolve(&args.data_source.to_lowercase())?;
    let ids = parse_ids_from_url(&args.airtable_url)?;
    info!(
        base = %ids.base_id,
        table = %ids.table_id,
        source = source.name,
        columns = ?source.columns,
        "startup"
    );

    // ─── 3) provision + upload ──────────────────────────────────────
    let client = AirtableClient::new(&config)?;
    let importer = Importer::new(client, ids, source);
    let summary = importer
        .run(&args.table_name, &args.csv_file)
        .with_context(|| format!("importing {}", args.csv_file.display()))?;
    info!(
        table = %summary.table.id,
        created = summary.created_table,
        records = summary.records,
        "done"
    );

    println!("{}", importer.confirmation(&args.csv_file));
    Ok(())
}
