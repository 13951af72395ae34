//! pipeline-fetch: Fetch a paginated JSON API into a flat table
//!
//! Usage:
//!   # Harvest time entries, page count read from the first page, NDJSON to stdout
//!   pipeline-fetch --auth harvest -k time_entries \
//!       "https://api.harvestapp.com/v2/time_entries?per_page=100&page="
//!
//!   # Explicit headers and page count, load into the local warehouse
//!   pipeline-fetch -H "Authorization=Bearer xyz" --pages 12 -k people \
//!       --dataset hibob --table people --write-disposition WRITE_TRUNCATE \
//!       "https://api.example.com/people?page="
//!
//! Secrets for `--auth` are read from `PIPELINE_SECRET_<NAME>` variables.

// Use MiMalloc allocator for better performance
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use pipeline_tools::auth::{
    forecast_headers, harvest_headers, hibob_headers, CachedCredentials, CredentialsProvider,
    EnvCredentials,
};
use pipeline_tools::fetch::{harvest_pages, BatchFetcher, Headers, HttpJsonSource, PageErrorPolicy};
use pipeline_tools::flatten::Flattener;
use pipeline_tools::warehouse::{
    JsonLinesWarehouse, LoadConfig, TableWriter, WarehouseLoader, WriteDisposition,
};
use pipeline_tools::{load_config, Table};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Integration {
    Harvest,
    Hibob,
    Forecast,
}

#[derive(Parser, Debug)]
#[command(name = "pipeline-fetch")]
#[command(about = "Fetch a paginated JSON API into a flat table", long_about = None)]
struct Args {
    /// URL prefix; the page number is appended to it
    #[arg(value_name = "URL_PREFIX")]
    url_prefix: String,

    /// Key of the array holding the records in each page
    #[arg(long, short = 'k')]
    array_key: String,

    /// Number of pages to fetch (read from the first page's `total_pages` if omitted)
    #[arg(long)]
    pages: Option<u32>,

    /// Pages fetched concurrently per batch
    #[arg(long)]
    batch_size: Option<usize>,

    /// Retries per page for timeouts, connection errors, 5xx and 429
    #[arg(long)]
    max_retries: Option<u32>,

    /// Leave failing pages out instead of aborting
    #[arg(long)]
    skip_failed_pages: bool,

    /// Extra request header as NAME=VALUE (repeatable)
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Build auth headers for a known integration from secrets
    #[arg(long, value_enum)]
    auth: Option<Integration>,

    /// Value of the `service` header sent to Harvest and Hibob
    #[arg(long, default_value = "data-pipeline")]
    service: String,

    /// Comma-separated columns to flatten (auto-detected if omitted)
    #[arg(long, conflicts_with = "no_flatten")]
    flatten: Option<String>,

    /// Keep nested columns as they are
    #[arg(long)]
    no_flatten: bool,

    /// TOML configuration file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Load into this dataset of the local warehouse instead of writing to stdout
    #[arg(long, requires = "table")]
    dataset: Option<String>,

    /// Table to load into
    #[arg(long, requires = "dataset")]
    table: Option<String>,

    /// WRITE_APPEND, WRITE_TRUNCATE or WRITE_EMPTY
    #[arg(long, default_value = "WRITE_APPEND")]
    write_disposition: WriteDisposition,
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Build config
    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(batch_size) = args.batch_size {
        config.fetch.batch_size = batch_size;
    }
    if let Some(retries) = args.max_retries {
        config.fetch.max_retries = retries;
    }
    if args.skip_failed_pages {
        config.fetch.on_page_error = PageErrorPolicy::Skip;
    }

    let mut headers = match args.auth {
        Some(integration) => {
            let secrets = CachedCredentials::new(EnvCredentials::new(), Duration::from_secs(3600));
            integration_headers(&secrets, integration, &args.service).await?
        }
        None => Headers::new(),
    };
    headers.extend(args.headers.iter().cloned());

    let source = HttpJsonSource::new(config.fetch.timeout())?;

    let pages = match args.pages {
        Some(pages) => pages,
        None => {
            let Some(count) = harvest_pages(&source, &args.url_prefix, &headers).await else {
                bail!("Could not determine the page count; pass --pages");
            };
            info!(
                total_pages = count.total_pages,
                total_entries = count.total_entries,
                "pagination totals"
            );
            count.total_pages
        }
    };

    let fetcher = BatchFetcher::new(source, config.fetch.clone());
    let report = fetcher
        .fetch_report(&args.url_prefix, &headers, pages, &args.array_key)
        .await
        .context("Failed to fetch pages")?;
    if !report.skipped_pages.is_empty() {
        eprintln!("⚠ Warning: skipped pages {:?}", report.skipped_pages);
    }

    let table = flatten_table(report.table, &args, Flattener::new(config.flatten.clone()))?;

    if let (Some(dataset), Some(table_name)) = (args.dataset, args.table) {
        let destination = LoadConfig {
            dataset_id: dataset,
            table_name,
            location: config.warehouse.location.clone(),
        };
        let warehouse = JsonLinesWarehouse::new(&config.warehouse.root);
        warehouse
            .load(&destination, &table, args.write_disposition)
            .await
            .context("Failed to load table")?;
    } else {
        let stdout = std::io::stdout();
        let mut writer = TableWriter::new(stdout.lock());
        writer.write_table(&table)?;
        writer.flush()?;
    }

    Ok(())
}

async fn integration_headers<P: CredentialsProvider>(
    secrets: &P,
    integration: Integration,
    service: &str,
) -> Result<Headers> {
    let headers = match integration {
        Integration::Harvest => harvest_headers(secrets, service).await,
        Integration::Hibob => hibob_headers(secrets, service).await,
        Integration::Forecast => forecast_headers(secrets).await,
    };
    headers.context("Failed to build auth headers")
}

fn flatten_table(table: Table, args: &Args, flattener: Flattener) -> Result<Table> {
    if args.no_flatten {
        return Ok(table);
    }

    let flat = match &args.flatten {
        Some(columns) => {
            let columns: Vec<&str> = columns.split(',').map(str::trim).collect();
            flattener.flatten(table, columns.as_slice())?
        }
        None => flattener.auto_flatten(table)?,
    };
    Ok(flat)
}
