//! pipeline-flatten: Flatten nested JSON records into a flat table
//!
//! Usage:
//!   # JSON array of records from a file, auto-detect nested columns
//!   pipeline-flatten records.json
//!
//!   # NDJSON from stdin, flatten named columns
//!   cat entries.jsonl | pipeline-flatten --ndjson --columns client,project
//!
//!   # A saved API page: take the records under a key, scan every row
//!   pipeline-flatten --array-key time_entries --scan all page1.json

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use pipeline_tools::flatten::{FlattenConfig, Flattener, NestedScan};
use pipeline_tools::warehouse::TableWriter;
use pipeline_tools::Table;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pipeline-flatten")]
#[command(about = "Flatten nested JSON records into a flat table", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Process newline-delimited JSON (one record per line)
    #[arg(long)]
    ndjson: bool,

    /// Take records from the array under this key of a single JSON object
    #[arg(long, short = 'k')]
    array_key: Option<String>,

    /// Comma-separated columns to flatten (auto-detected if omitted)
    #[arg(long)]
    columns: Option<String>,

    /// Rows scanned by auto-detection: "first", "all" or a row count
    #[arg(long, default_value = "first", value_parser = parse_scan)]
    scan: NestedScan,

    /// Separator between column name and nested key (default: "_")
    #[arg(long)]
    separator: Option<String>,

    /// Extra object levels to expand (default: 0)
    #[arg(long)]
    max_level: Option<usize>,

    /// Output file (stdout if omitted)
    #[arg(long, short = 'o')]
    output: Option<String>,
}

fn parse_scan(s: &str) -> Result<NestedScan, String> {
    match s {
        "first" | "first-row" => Ok(NestedScan::FirstRow),
        "all" => Ok(NestedScan::All),
        n => n
            .parse::<usize>()
            .map(NestedScan::Sample)
            .map_err(|_| format!("expected 'first', 'all' or a row count, got '{}'", n)),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Build config
    let mut config = FlattenConfig {
        scan: args.scan,
        ..FlattenConfig::default()
    };
    if let Some(sep) = args.separator.clone() {
        config.separator = sep;
    }
    if let Some(level) = args.max_level {
        config.max_level = level;
    }

    let reader = if let Some(file_path) = &args.input {
        Box::new(BufReader::new(
            File::open(file_path).with_context(|| format!("Failed to open {}", file_path))?,
        )) as Box<dyn Read>
    } else {
        Box::new(std::io::stdin()) as Box<dyn Read>
    };

    let records = read_records(reader, args.ndjson, args.array_key.as_deref())?;
    info!(records = records.len(), "read records");

    let flattener = Flattener::new(config);
    let table = Table::from_records(records);
    let flat = match &args.columns {
        Some(columns) => {
            let columns: Vec<&str> = columns.split(',').map(str::trim).collect();
            flattener.flatten(table, columns.as_slice())?
        }
        None => flattener.auto_flatten(table)?,
    };

    let rows = match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create {}", path))?;
            let mut writer = TableWriter::new(BufWriter::new(file));
            let rows = writer.write_table(&flat)?;
            writer.flush()?;
            rows
        }
        None => {
            let mut writer = TableWriter::new(std::io::stdout().lock());
            let rows = writer.write_table(&flat)?;
            writer.flush()?;
            rows
        }
    };
    info!(rows, columns = flat.columns().len(), "wrote flat table");

    Ok(())
}

/// Read records using SIMD-accelerated JSON parsing, falling back to NDJSON lines
fn read_records(reader: Box<dyn Read>, ndjson: bool, array_key: Option<&str>) -> Result<Vec<Value>> {
    let mut content = Vec::new();
    let mut buf_reader = BufReader::new(reader);
    buf_reader.read_to_end(&mut content)?;

    if ndjson {
        return parse_lines(&content);
    }

    // simd-json parses in place; keep the original bytes for the NDJSON fallback
    let mut scratch = content.clone();
    match simd_json::serde::from_slice::<Value>(&mut scratch) {
        Ok(Value::Array(records)) => Ok(records),
        Ok(Value::Object(mut obj)) => match array_key {
            Some(key) => match obj.remove(key) {
                Some(Value::Array(records)) => Ok(records),
                Some(_) => anyhow::bail!("Field '{}' is not an array", key),
                None => anyhow::bail!("Input has no '{}' field", key),
            },
            None => Ok(vec![Value::Object(obj)]),
        },
        Ok(other) => Ok(vec![other]),
        Err(_) => parse_lines(&content),
    }
}

fn parse_lines(content: &[u8]) -> Result<Vec<Value>> {
    let content_str = String::from_utf8_lossy(content);
    let mut records = Vec::new();
    for (number, line) in content_str.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("Failed to parse JSON on line {}", number + 1))?;
        records.push(value);
    }
    Ok(records)
}
