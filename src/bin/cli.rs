//! fluxql CLI
//!
//! Command-line interface for the Flux compiler:
//! - Compile a query description and print the pipeline
//! - Run it against the configured store
//! - Generate a default config file

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use fluxql::client::Connection;
use fluxql::config::{generate_default_config, Config};
use fluxql::query::{compile, parse_datetime, Predicate, QueryDescriptor, Value};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fluxql")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compile relational-style queries into Flux pipelines")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: standard locations, then environment)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the Flux pipeline for a query
    Compile(QueryArgs),

    /// Run a query and print rows as JSON lines
    Query(QueryArgs),

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
pub struct QueryArgs {
    /// Measurement to read
    #[arg(short, long)]
    measurement: String,

    /// Bucket (default: from config, else "default")
    #[arg(short, long)]
    bucket: Option<String>,

    /// Filters as field__lookup=value, e.g. time__gte=-1h or device=sensor-1
    #[arg(short, long = "filter")]
    filters: Vec<String>,

    /// OR-combine the filters instead of AND
    #[arg(long)]
    any: bool,

    /// Columns to keep
    #[arg(short, long = "values")]
    values: Vec<String>,

    /// Sort columns; prefix with '-' for descending
    #[arg(short, long = "order-by", allow_hyphen_values = true)]
    order_by: Vec<String>,

    /// Rows to skip
    #[arg(long)]
    offset: Option<u64>,

    /// Maximum rows to return
    #[arg(short, long)]
    limit: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    match cli.command {
        Commands::Compile(args) => {
            let descriptor = build_descriptor(&args, config.connection.bucket.as_deref())?;
            let compiled = compile(&descriptor)?;
            println!("{}", compiled.flux);
        }

        Commands::Query(args) => {
            fluxql::logging::init(&config.logging)?;

            let descriptor = build_descriptor(&args, config.connection.bucket.as_deref())?;
            let connection = Connection::connect(&config.connection)?;
            let rows = connection
                .execute_descriptor(&descriptor)
                .context("query failed")?;

            for row in &rows {
                println!("{}", serde_json::to_string(row)?);
            }
            tracing::info!("{} rows", rows.len());
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("writing {:?}", path))?;
                    eprintln!("Wrote default config to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn build_descriptor(args: &QueryArgs, default_bucket: Option<&str>) -> anyhow::Result<QueryDescriptor> {
    let mut filters = Vec::with_capacity(args.filters.len());
    for filter in &args.filters {
        let (key, raw) = filter
            .split_once('=')
            .with_context(|| format!("filter {:?} is not field__lookup=value", filter))?;
        filters.push(Predicate::lookup(key, parse_value(raw)));
    }

    let predicate = match (filters.is_empty(), args.any) {
        (true, _) => None,
        (false, false) => Some(Predicate::and(filters)),
        (false, true) => Some(Predicate::or(filters)),
    };

    let low_mark = args.offset;
    let high_mark = args.limit.map(|n| low_mark.unwrap_or(0).saturating_add(n));

    Ok(QueryDescriptor {
        bucket: args.bucket.clone().or_else(|| default_bucket.map(str::to_string)),
        measurement: args.measurement.clone(),
        predicate,
        columns: args.values.clone(),
        ordering: args.order_by.iter().map(|o| fluxql::OrderBy::parse(o)).collect(),
        low_mark,
        high_mark,
    })
}

/// Type a command-line value: null, bool, integer, float, datetime, else string
fn parse_value(raw: &str) -> Value {
    match raw {
        "null" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Int(i);
    }
    if raw.chars().any(|c| c.is_ascii_digit()) {
        if let Ok(f) = raw.parse::<f64>() {
            return Value::Float(f);
        }
    }
    match parse_datetime(raw) {
        Some(dt) => Value::DateTime(dt),
        None => Value::Str(raw.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(filters: &[&str]) -> QueryArgs {
        QueryArgs {
            measurement: "temperature".to_string(),
            bucket: None,
            filters: filters.iter().map(|f| f.to_string()).collect(),
            any: false,
            values: vec![],
            order_by: vec!["-time".to_string()],
            offset: Some(5),
            limit: Some(5),
        }
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("null"), Value::Null);
        assert_eq!(parse_value("true"), Value::Bool(true));
        assert_eq!(parse_value("42"), Value::Int(42));
        assert_eq!(parse_value("21.5"), Value::Float(21.5));
        assert_eq!(parse_value("nan"), Value::Str("nan".to_string()));
        assert_eq!(parse_value("-1h"), Value::Str("-1h".to_string()));
        assert!(matches!(parse_value("2024-05-01T12:00:00Z"), Value::DateTime(_)));
    }

    #[test]
    fn test_build_descriptor() {
        let descriptor = build_descriptor(
            &args(&["time__gte=2024-05-01T12:00:00Z", "device=sensor-1"]),
            Some("example-bucket"),
        )
        .unwrap();

        assert_eq!(descriptor.bucket.as_deref(), Some("example-bucket"));
        assert_eq!(descriptor.low_mark, Some(5));
        assert_eq!(descriptor.high_mark, Some(10));

        let flux = compile(&descriptor).unwrap().flux;
        assert!(flux.contains("|> range(start: 2024-05-01T12:00:00+00:00)"));
        assert!(flux.contains(r#"r["device"] == "sensor-1""#));
        assert!(flux.ends_with("|> limit(n: 5, offset: 5)"));
    }

    #[test]
    fn test_extreme_pagination_saturates() {
        let mut query = args(&[]);
        query.offset = Some(u64::MAX - 1);
        query.limit = Some(10);

        let descriptor = build_descriptor(&query, None).unwrap();
        assert_eq!(descriptor.high_mark, Some(u64::MAX));

        let flux = compile(&descriptor).unwrap().flux;
        assert!(flux.ends_with(&format!("|> limit(n: 1, offset: {})", u64::MAX - 1)));
    }

    #[test]
    fn test_malformed_filter() {
        assert!(build_descriptor(&args(&["device"]), None).is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "fluxql", "compile", "-m", "temperature", "-f", "device=a", "-o", "-time",
        ])
        .unwrap();
        match cli.command {
            Commands::Compile(args) => {
                assert_eq!(args.order_by, vec!["-time"]);
                assert_eq!(args.filters, vec!["device=a"]);
            }
            _ => panic!("expected compile"),
        }
    }
}
