use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use minio_statemap::output::{OutputFormat, StatemapMeta};
use minio_statemap::reader::InputFormat;
use minio_statemap::{convert_file, ConvertConfig, OrphanPolicy};

/// Convert MinIO JSON trace output to statemap input
#[derive(Debug, Parser)]
#[command(name = "minio-statemap")]
#[command(version)]
#[command(after_help = "Example usage:\n  minio-statemap -i ./my_minio_trace.out > minio_states")]
struct Command {
    /// Path to minio trace file to be parsed ("-" for stdin)
    #[arg(short, long, value_name = "FILE")]
    input_file: PathBuf,
    /// Name of the cluster for display in the rendered statemap
    #[arg(short, long, value_name = "NAME", default_value = "minio cluster")]
    cluster_name: String,
    /// Statemap title
    #[arg(short, long, default_value = "MinIO")]
    title: String,
    /// Format of the input trace
    #[arg(long, value_enum, default_value_t = InputFormat::Minio)]
    format: InputFormat,
    /// Format of the output written to stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Statemap)]
    output_format: OutputFormat,
    /// JSON file with state priorities, colors and orphan handling
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Drop END events without a matching BEGIN instead of failing
    #[arg(long)]
    lenient: bool,
    /// Label for entities with no requests in flight
    #[arg(long, value_name = "LABEL")]
    idle_label: Option<String>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .compact()
        .init();
}

fn load_config(opts: &Command) -> Result<ConvertConfig> {
    let mut config = match &opts.config {
        Some(path) => ConvertConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => ConvertConfig::default(),
    };
    if opts.lenient {
        config.orphan_policy = OrphanPolicy::Warn;
    }
    if let Some(label) = &opts.idle_label {
        config.idle_label = label.clone();
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let opts = Command::parse();
    init_logging(opts.verbose);

    let config = load_config(&opts)?;
    let meta = StatemapMeta {
        title: opts.title.clone(),
        host: opts.cluster_name.clone(),
        entity_kind: config.entity_kind.clone(),
    };

    let summary = convert_file(
        &opts.input_file,
        opts.format,
        &config,
        &meta,
        opts.output_format,
        io::stdout().lock(),
    )?;
    tracing::debug!("{:?}", summary);

    Ok(())
}
